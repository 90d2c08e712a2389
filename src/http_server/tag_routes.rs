//! Tag HTTP Routes

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::gate::Endpoint;
use crate::models::{tag, Page};

use super::errors::{ApiError, ApiResult};
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, ok, request_data, AppState};

pub fn tag_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(get_tags_like).post(post_tags))
        .route("/tags/:tagname", get(get_tag))
}

#[derive(Debug, Deserialize)]
struct NewTagBody {
    tagname: String,
    #[serde(default)]
    description: String,
}

async fn post_tags(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, PathParams::default(), query, body);
    state.admit(Endpoint::PostTags, &request)?;

    let body: NewTagBody = decode_body(&request)?;
    let created_tag = tag::create(state.store(), &body.tagname, &body.description, &me).await?;
    Ok(created(created_tag))
}

async fn get_tag(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetTag, &request)?;

    let tagname = request.param("tagname").unwrap_or_default();
    let found = tag::read(state.store(), tagname)
        .await?
        .ok_or(ApiError::NotFound("tag"))?;
    Ok(ok(found))
}

/// `GET /tags?filter[like]=keyword`
async fn get_tags_like(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, PathParams::default(), query, JsonBody(None));
    state.admit(Endpoint::GetTagsLike, &request)?;

    let keyword = request
        .query
        .pointer("/filter/like/0")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let tags = tag::list_like(state.store(), keyword, Page::from_query(&request.query)).await?;
    Ok(ok(tags))
}
