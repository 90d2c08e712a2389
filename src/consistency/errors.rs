//! Consistency error types

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A field path that cannot be parsed.
///
/// Paths are declared statically per endpoint, so this is raised at boot
/// when gates are built, never while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty field path")]
    Empty,

    #[error("unknown request part '{0}' (expected body, params, query or auth)")]
    UnknownPart(String),

    #[error("malformed field path '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

pub type PathResult<T> = Result<T, PathError>;

/// Two request-derived values that were required to agree and do not.
///
/// `fields` names both compared sides (a composite side is rendered as
/// `[a, b]`), `values` holds what they resolved to, `null` for missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyError {
    pub fields: [String; 2],
    pub values: [Value; 2],
    pub message: String,
}

impl std::fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} = {}, {} = {})",
            self.message, self.fields[0], self.values[0], self.fields[1], self.values[1]
        )
    }
}
