//! Comment HTTP Routes
//!
//! Comments are created and listed under their dit; editing, deleting and
//! voting address the comment directly.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::{delete, patch, post},
    Router,
};
use serde::Deserialize;

use crate::gate::Endpoint;
use crate::models::comment;
use crate::models::vote::{self, VoteTarget};

use super::dit_routes::VoteBody;
use super::errors::ApiResult;
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, no_content, ok, request_data, AppState};

pub fn comment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comments/:id", patch(patch_comment).delete(delete_comment))
        .route("/comments/:id/votes", post(post_comment_votes))
        .route("/comments/:id/votes/vote", delete(delete_comment_vote))
}

#[derive(Debug, Deserialize)]
struct CommentPatchBody {
    content: String,
}

async fn patch_comment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PatchComment, &request)?;

    let body: CommentPatchBody = decode_body(&request)?;
    let id = request.param("id").unwrap_or_default();
    let updated = comment::update(state.store(), id, &me, &body.content).await?;
    Ok(ok(updated))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteComment, &request)?;

    let id = request.param("id").unwrap_or_default();
    comment::remove(state.store(), id, &me).await?;
    Ok(no_content())
}

async fn post_comment_votes(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostVotes, &request)?;

    let body: VoteBody = decode_body(&request)?;
    let id = request.param("id").unwrap_or_default();
    let cast = vote::create(state.store(), VoteTarget::Comment(id), &me, body.value).await?;
    Ok(created(cast))
}

async fn delete_comment_vote(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteVote, &request)?;

    let id = request.param("id").unwrap_or_default();
    vote::remove(state.store(), VoteTarget::Comment(id), &me).await?;
    Ok(no_content())
}
