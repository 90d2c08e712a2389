//! Message HTTP Routes
//!
//! `GET /messages` lists either one conversation (`filter[with]=user`) or
//! the latest message of every conversation (`filter[threads]`).

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::gate::Endpoint;
use crate::models::{message, Page};

use super::errors::ApiResult;
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, ok, request_data, AppState};

pub fn message_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", get(get_messages).post(post_messages))
        .route("/messages/:id", patch(patch_message))
}

#[derive(Debug, Deserialize)]
struct Receiver {
    username: String,
}

#[derive(Debug, Deserialize)]
struct NewMessageBody {
    body: String,
    to: Receiver,
}

async fn post_messages(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, PathParams::default(), query, body);
    state.admit(Endpoint::PostMessages, &request)?;

    let body: NewMessageBody = decode_body(&request)?;
    let sent = message::create(state.store(), &me, &body.to.username, &body.body).await?;
    Ok(created(sent))
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, PathParams::default(), query, JsonBody(None));
    let page = Page::from_query(&request.query);

    let messages = if request.query.pointer("/filter/threads").is_some() {
        state.admit(Endpoint::GetThreads, &request)?;
        message::threads(state.store(), &me, page).await?
    } else {
        state.admit(Endpoint::GetMessages, &request)?;
        let other = request
            .query
            .pointer("/filter/with/0")
            .and_then(Value::as_str)
            .unwrap_or_default();
        message::thread(state.store(), &me, other, page).await?
    };
    Ok(ok(messages))
}

/// Marks a message as read
async fn patch_message(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PatchMessage, &request)?;

    let id = request.param("id").unwrap_or_default();
    let read = message::mark_read(state.store(), id, &me).await?;
    Ok(ok(read))
}
