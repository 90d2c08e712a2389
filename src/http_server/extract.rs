//! Request extractors
//!
//! Decoding failures are reported as `ApiError` so that every 4xx response
//! shares the same error document.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use serde_json::{Map, Value};

use crate::auth::AuthError;
use crate::request::{parse_query, AuthInfo};

use super::errors::{ApiError, ApiResult};
use super::server::AppState;

/// The caller as identified by an optional bearer token.
///
/// No `Authorization` header means anonymous; a header that is present but
/// does not hold a valid bearer token is refused.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthInfo);

impl Caller {
    pub fn auth(&self) -> AuthInfo {
        self.0.clone()
    }

    pub fn username(&self) -> Option<&str> {
        self.0.username.as_deref()
    }

    /// Username of a logged in caller with a verified email
    pub fn verified(&self) -> ApiResult<&str> {
        match (&self.0.username, self.0.logged) {
            (Some(username), true) => Ok(username.as_str()),
            (Some(_), false) => Err(AuthError::EmailNotVerified.into()),
            (None, _) => Err(AuthError::AuthenticationRequired.into()),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Caller(AuthInfo::anonymous()));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MalformedToken)?;

        let claims = state.jwt.validate(token.trim())?;
        Ok(Caller(AuthInfo::from_claims(&claims)))
    }
}

/// Path parameters as a JSON object
#[derive(Debug, Clone, Default)]
pub struct PathParams(pub Map<String, Value>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PathParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;

        Ok(PathParams(
            params.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        ))
    }
}

/// The query string parsed into its nested object form
#[derive(Debug, Clone)]
pub struct QueryData(pub Value);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryData {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;

        Ok(QueryData(parse_query(pairs)))
    }
}

/// A JSON body; an empty body is `None`. The size cap comes from the
/// router's `DefaultBodyLimit`.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Option<Value>);

impl JsonBody {
    pub fn into_inner(self) -> Option<Value> {
        self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::TooLarge,
            _ => ApiError::Malformed(e.body_text()),
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| JsonBody(Some(value)))
            .map_err(|e| ApiError::Malformed(format!("invalid JSON body: {}", e)))
    }
}
