//! HTTP Boundary Errors
//!
//! Every failure a handler can produce ends up here and is rendered as a
//! JSON:API style error document `{ "errors": [ ... ] }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::gate::Rejection;
use crate::models::ModelError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint gate turned the request away
    #[error("invalid request for {endpoint}: {} error(s)", .rejection.len())]
    Rejected {
        endpoint: &'static str,
        rejection: Rejection,
    },

    /// Body, query string or path could not be decoded at all
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("request body is too large")]
    TooLarge,

    /// A read found nothing
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// One entry of the error document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub status: String,
    pub code: &'static str,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Rejected { .. } | ApiError::Malformed(_) => 400,
            ApiError::TooLarge => 413,
            ApiError::NotFound(_) => 404,
            ApiError::Model(e) => e.status_code(),
            ApiError::Auth(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Rejected {
                rejection: Rejection::Structural(_),
                ..
            } => "DIT_INVALID_STRUCTURE",
            ApiError::Rejected {
                rejection: Rejection::Consistency(_),
                ..
            } => "DIT_INCONSISTENT_REQUEST",
            ApiError::Malformed(_) => "DIT_MALFORMED_REQUEST",
            ApiError::TooLarge => "DIT_BODY_TOO_LARGE",
            ApiError::NotFound(_) => "DIT_NOT_FOUND",
            ApiError::Model(e) => e.code(),
            ApiError::Auth(e) => e.code(),
        }
    }

    /// The error document entries; a rejection yields one entry per violation
    pub fn objects(&self) -> Vec<ErrorObject> {
        let status = self.status_code();
        let title = status.canonical_reason().unwrap_or("Error").to_string();
        let entry = |detail: String, source: Option<Value>| ErrorObject {
            status: status.as_u16().to_string(),
            code: self.code(),
            title: title.clone(),
            detail,
            source,
        };

        match self {
            ApiError::Rejected {
                rejection: Rejection::Structural(errors),
                ..
            } => errors
                .iter()
                .map(|e| {
                    entry(
                        e.message.clone(),
                        Some(json!({ "pointer": e.path, "keyword": e.keyword.as_str() })),
                    )
                })
                .collect(),
            ApiError::Rejected {
                rejection: Rejection::Consistency(errors),
                ..
            } => errors
                .iter()
                .map(|e| entry(e.message.clone(), Some(json!({ "fields": e.fields, "values": e.values }))))
                .collect(),
            // Store failures are not described to clients
            ApiError::Model(ModelError::Store(_)) | ApiError::Model(ModelError::Unclassified(_)) => {
                vec![entry("the request could not be completed".to_string(), None)]
            }
            other => vec![entry(other.to_string(), None)],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {}", self);
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(code = self.code(), "request refused: {}", self);
        }

        (status, Json(json!({ "errors": self.objects() }))).into_response()
    }
}
