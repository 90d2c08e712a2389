//! # Model Errors
//!
//! Outcomes of the query layer that are not a record. `NotFound`,
//! `Forbidden` and `Conflict` are classified from a single conditional
//! write; everything else is passed through unclassified.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The entity exists but the actor may not perform this change
    #[error("{0}")]
    Forbidden(&'static str),

    /// The write would duplicate an existing entity
    #[error("{0} already exists")]
    Conflict(&'static str),

    /// The store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The write did nothing and no precondition explains why
    #[error("statement '{0}' wrote nothing for an unknown reason")]
    Unclassified(&'static str),
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::NotFound(_) => "DIT_NOT_FOUND",
            ModelError::Forbidden(_) => "DIT_FORBIDDEN",
            ModelError::Conflict(_) => "DIT_CONFLICT",
            ModelError::Store(err) => err.code(),
            ModelError::Unclassified(_) => "DIT_UNCLASSIFIED_WRITE",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ModelError::NotFound(_) => 404,
            ModelError::Forbidden(_) => 403,
            ModelError::Conflict(_) => 409,
            ModelError::Store(_) | ModelError::Unclassified(_) => 500,
        }
    }
}
