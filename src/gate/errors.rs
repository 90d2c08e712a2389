//! Gate construction errors
//!
//! Gates are built once at boot. Any error here means the endpoint table
//! and the schema set disagree, and the process must not start.

use thiserror::Error;

use crate::consistency::PathError;
use crate::schema::SchemaError;

pub type GateBuildResult<T> = Result<T, GateBuildError>;

#[derive(Debug, Clone, Error)]
pub enum GateBuildError {
    #[error("gate '{endpoint}': {source}")]
    Schema {
        endpoint: &'static str,
        #[source]
        source: SchemaError,
    },

    #[error("gate '{endpoint}': {source}")]
    Path {
        endpoint: &'static str,
        #[source]
        source: PathError,
    },
}

impl GateBuildError {
    pub fn code(&self) -> &'static str {
        match self {
            GateBuildError::Schema { source, .. } => source.code(),
            GateBuildError::Path { .. } => "DIT_INVALID_FIELD_PATH",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            GateBuildError::Schema { endpoint, .. } | GateBuildError::Path { endpoint, .. } => endpoint,
        }
    }
}
