//! Auth HTTP Routes
//!
//! `POST /auth/token` exchanges HTTP basic credentials (username or email
//! plus password) for a bearer token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::debug;

use crate::auth::{crypto, AuthError};
use crate::models::user;

use super::errors::ApiResult;
use super::server::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/token", post(token_handler))
}

async fn token_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Response> {
    let (identifier, password) = basic_credentials(&headers).ok_or(AuthError::AuthenticationRequired)?;

    let credentials = user::read_credentials(state.store(), &identifier)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !crypto::verify_password(&password, &credentials.password_hash)? {
        debug!(user = %credentials.username, "wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.jwt.issue(&credentials)?;
    Ok((StatusCode::OK, Json(json!({ "meta": { "token": token } }))).into_response())
}

/// `Authorization: Basic base64(identifier:password)`
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (identifier, password) = decoded.split_once(':')?;
    Some((identifier.to_string(), password.to_string()))
}
