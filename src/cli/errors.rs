//! CLI-specific error types
//!
//! Every CLI error is fatal: `main` prints it and exits non-zero.

use thiserror::Error;

use crate::config::ConfigError;
use crate::gate::GateBuildError;
use crate::models::ModelError;
use crate::schema::SchemaError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Gate(#[from] GateBuildError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Schema(e) => e.code(),
            Self::Gate(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Model(e) => e.code(),
            Self::Io(_) => "DIT_CLI_IO_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_codes_delegate_to_source() {
        let err = CliError::from(ConfigError::Read {
            path: PathBuf::from("x.json"),
            reason: "missing".into(),
        });
        assert_eq!(err.code(), "DIT_CONFIG_READ");
        assert!(err.to_string().contains("x.json"));
    }

    #[test]
    fn test_missing_user_keeps_model_code() {
        let err = CliError::from(ModelError::NotFound("user"));
        assert_eq!(err.code(), "DIT_NOT_FOUND");
        assert_eq!(err.to_string(), "user not found");
    }
}
