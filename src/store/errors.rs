//! Graph store errors
//!
//! None of these are classified: they reach the HTTP boundary as 500s.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The engine could not be reached or the connection failed mid-way
    #[error("graph store unreachable: {0}")]
    Transport(String),

    /// The engine answered with an error document
    #[error("graph store error {num} (http {status}): {message}")]
    Engine { status: u16, num: i64, message: String },

    /// The engine answered with something that is not a cursor document
    #[error("unexpected graph store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Transport(_) => "DIT_STORE_UNREACHABLE",
            StoreError::Engine { .. } => "DIT_STORE_ENGINE",
            StoreError::Decode(_) => "DIT_STORE_DECODE",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
