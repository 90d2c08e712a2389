//! Contact HTTP Routes
//!
//! `PATCH /contacts/:from/:to` serves two endpoints: a body carrying
//! `isConfirmed` confirms a pending contact, any other body edits the
//! caller's side of it.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::gate::Endpoint;
use crate::models::contact::{self, ContactPatch, NewContact};

use super::errors::{ApiError, ApiResult};
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, no_content, ok, request_data, AppState};

pub fn contact_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts", post(post_contacts))
        .route(
            "/contacts/:from/:to",
            get(get_contact).patch(patch_contact).delete(delete_contact),
        )
}

#[derive(Debug, Deserialize)]
struct Receiver {
    username: String,
}

#[derive(Debug, Deserialize)]
struct NewContactBody {
    trust: u8,
    #[serde(default)]
    reference: String,
    #[serde(default)]
    message: String,
    to: Receiver,
}

#[derive(Debug, Deserialize)]
struct ConfirmBody {
    trust: u8,
    #[serde(default)]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct ContactPatchBody {
    trust: Option<u8>,
    reference: Option<String>,
    message: Option<String>,
}

async fn post_contacts(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, PathParams::default(), query, body);
    state.admit(Endpoint::PostContacts, &request)?;

    let body: NewContactBody = decode_body(&request)?;
    let new = NewContact {
        from: me,
        to: body.to.username,
        trust: body.trust,
        reference: body.reference,
        message: body.message,
    };
    let created_contact = contact::create(state.store(), &new).await?;
    Ok(created(created_contact))
}

/// Unconfirmed contacts are only visible to their two parties
async fn get_contact(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetContact, &request)?;

    let from = request.param("from").unwrap_or_default();
    let to = request.param("to").unwrap_or_default();
    let found = contact::read(state.store(), from, to)
        .await?
        .filter(|c| c.is_confirmed || matches!(caller.username(), Some(me) if me == from || me == to))
        .ok_or(ApiError::NotFound("contact"))?;
    Ok(ok(found))
}

async fn patch_contact(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    let confirming = request
        .body
        .as_ref()
        .map_or(false, |body| body.get("isConfirmed").is_some());

    let from = request.param("from").unwrap_or_default();
    let to = request.param("to").unwrap_or_default();

    let updated = if confirming {
        state.admit(Endpoint::PatchConfirmContact, &request)?;
        let body: ConfirmBody = decode_body(&request)?;
        contact::confirm(state.store(), from, to, body.trust, &body.reference).await?
    } else {
        state.admit(Endpoint::PatchContact, &request)?;
        let body: ContactPatchBody = decode_body(&request)?;
        let patch = ContactPatch {
            trust: body.trust,
            reference: body.reference,
            message: body.message,
        };
        contact::update(state.store(), from, to, &me, &patch).await?
    };
    Ok(ok(updated))
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    caller.verified()?;
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteContact, &request)?;

    let from = request.param("from").unwrap_or_default();
    let to = request.param("to").unwrap_or_default();
    contact::remove(state.store(), from, to).await?;
    Ok(no_content())
}
