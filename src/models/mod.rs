//! # Query Construction Layer
//!
//! One module per entity. Each operation builds a fresh `Statement` (an AQL
//! template plus bind parameters), executes it in a single round trip and
//! turns the rows into plain records.
//!
//! Writes that depend on other entities are conditional: the statement
//! evaluates every precondition, performs the write only when all of them
//! hold, and reports the preconditions next to the written record. See
//! [`classify`] for how a refused write becomes `NotFound`, `Forbidden` or
//! `Conflict`.

pub mod care;
pub mod classify;
pub mod comment;
pub mod contact;
pub mod dit;
pub mod dit_tag;
mod errors;
pub mod message;
pub mod tag;
pub mod user;
pub mod user_tag;
pub mod vote;

pub use classify::{Check, WriteChecks};
pub use dit::DitKind;
pub use errors::{ModelError, ModelResult};

use serde::Serialize;
use serde_json::Value;

use crate::store::Statement;

/// Default number of records per page
pub const DEFAULT_LIMIT: u64 = 5;

/// Largest page a client may ask for
pub const MAX_LIMIT: u64 = 20;

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: limit.min(MAX_LIMIT),
        }
    }

    /// Reads `page[offset]` and `page[limit]` from a parsed query object
    pub fn from_query(query: &Value) -> Self {
        let page = query.get("page");
        let field = |name: &str| page.and_then(|p| p.get(name)).and_then(Value::as_u64);
        let default = Page::default();
        Page::new(
            field("offset").unwrap_or(default.offset),
            field("limit").unwrap_or(default.limit),
        )
    }

    /// Binds `@offset` and `@limit`
    pub(crate) fn bind(&self, statement: Statement) -> Statement {
        statement.bind("offset", self.offset).bind("limit", self.limit)
    }
}

/// `users/<key>` document handle
pub(crate) fn user_id(username: &str) -> String {
    format!("users/{}", username)
}
