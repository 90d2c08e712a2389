//! User HTTP Routes
//!
//! Profiles, the tags of a user and the contacts of a user.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::auth::crypto;
use crate::gate::Endpoint;
use crate::models::{contact, user, user_tag};

use super::errors::{ApiError, ApiResult};
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, no_content, ok, request_data, AppState};

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(post_users))
        .route("/users/:username", get(get_user).patch(patch_user))
        .route("/users/:username/tags", get(get_user_tags).post(post_user_tags))
        .route(
            "/users/:username/tags/:tagname",
            patch(patch_user_tag).delete(delete_user_tag),
        )
        .route("/users/:username/contacts", get(get_user_contacts))
}

#[derive(Debug, Deserialize)]
struct NewUserBody {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPatchBody {
    given_name: Option<String>,
    family_name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewUserTagBody {
    tagname: String,
    #[serde(default)]
    story: String,
    relevance: u8,
}

#[derive(Debug, Deserialize)]
struct UserTagPatchBody {
    story: Option<String>,
    relevance: Option<u8>,
}

async fn post_users(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let request = request_data(&caller, PathParams::default(), query, body);
    state.admit(Endpoint::PostUsers, &request)?;

    let body: NewUserBody = decode_body(&request)?;
    let hash = crypto::hash_password(&body.password)?;
    let created_user = user::create(state.store(), &body.username, &body.email, &hash).await?;
    Ok(created(created_user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetUser, &request)?;

    let username = request.param("username").unwrap_or_default();
    let found = user::read(state.store(), username)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(ok(found))
}

async fn patch_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    caller.verified()?;
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PatchUser, &request)?;

    let body: UserPatchBody = decode_body(&request)?;
    let patch = user::UserPatch {
        given_name: body.given_name,
        family_name: body.family_name,
        description: body.description,
    };
    let username = request.param("username").unwrap_or_default();
    let updated = user::update(state.store(), username, &patch).await?;
    Ok(ok(updated))
}

async fn get_user_tags(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetUserTags, &request)?;

    let username = request.param("username").unwrap_or_default();
    if !user::exists(state.store(), username).await? {
        return Err(ApiError::NotFound("user"));
    }
    let tags = user_tag::list_of_user(state.store(), username).await?;
    Ok(ok(tags))
}

async fn post_user_tags(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    caller.verified()?;
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostUserTags, &request)?;

    let body: NewUserTagBody = decode_body(&request)?;
    let username = request.param("username").unwrap_or_default();
    let tag = user_tag::create(state.store(), username, &body.tagname, &body.story, body.relevance).await?;
    Ok(created(tag))
}

async fn patch_user_tag(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    caller.verified()?;
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PatchUserTag, &request)?;

    let body: UserTagPatchBody = decode_body(&request)?;
    let patch = user_tag::UserTagPatch {
        story: body.story,
        relevance: body.relevance,
    };
    let username = request.param("username").unwrap_or_default();
    let tagname = request.param("tagname").unwrap_or_default();
    let updated = user_tag::update(state.store(), username, tagname, &patch).await?;
    Ok(ok(updated))
}

async fn delete_user_tag(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    caller.verified()?;
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteUserTag, &request)?;

    let username = request.param("username").unwrap_or_default();
    let tagname = request.param("tagname").unwrap_or_default();
    user_tag::remove(state.store(), username, tagname).await?;
    Ok(no_content())
}

async fn get_user_contacts(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetUserContacts, &request)?;

    let username = request.param("username").unwrap_or_default();
    if !user::exists(state.store(), username).await? {
        return Err(ApiError::NotFound("user"));
    }
    let contacts = contact::list_of_user(state.store(), username, caller.username()).await?;
    Ok(ok(contacts))
}
