//! Write outcome classification
//!
//! Conditional writes encode every precondition inside the statement and
//! return one row `{ checks: { <name>: bool, .. }, record }` from the same
//! round trip as the write. When nothing was written, the checks say why,
//! read in a fixed priority: missing entities (in declaration order), then
//! authorization, then uniqueness. No separate existence query is ever run
//! before a write.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::store::{QueryOutcome, StoreError};

use super::errors::{ModelError, ModelResult};

/// A named boolean reported by a conditional write
#[derive(Debug, Clone, Copy)]
pub struct Check {
    /// Key inside the `checks` object
    pub key: &'static str,
    /// Entity name (existence, uniqueness) or refusal reason (authorization)
    pub label: &'static str,
}

pub const fn check(key: &'static str, label: &'static str) -> Check {
    Check { key, label }
}

/// The preconditions of one conditional write, by tier
#[derive(Debug, Clone, Copy)]
pub struct WriteChecks {
    pub exists: &'static [Check],
    pub authorized: &'static [Check],
    pub unique: &'static [Check],
}

impl WriteChecks {
    pub const NONE: WriteChecks = WriteChecks {
        exists: &[],
        authorized: &[],
        unique: &[],
    };

    /// Decides the outcome of a write; returns the raw `record` on success
    pub fn classify(&self, statement: &'static str, outcome: &QueryOutcome) -> ModelResult<Value> {
        let row = outcome.first();

        if outcome.writes_executed > 0 {
            return Ok(row
                .and_then(|row| row.get("record"))
                .cloned()
                .unwrap_or(Value::Null));
        }

        let checks = row.and_then(|row| row.get("checks"));
        let passed = |check: &Check| {
            checks
                .and_then(|checks| checks.get(check.key))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };

        let error = if let Some(missing) = self.exists.iter().find(|c| !passed(*c)) {
            ModelError::NotFound(missing.label)
        } else if let Some(refused) = self.authorized.iter().find(|c| !passed(*c)) {
            ModelError::Forbidden(refused.label)
        } else if let Some(duplicate) = self.unique.iter().find(|c| !passed(*c)) {
            ModelError::Conflict(duplicate.label)
        } else {
            ModelError::Unclassified(statement)
        };

        debug!(statement, code = error.code(), "write rejected: {}", error);
        Err(error)
    }

    /// Classifies and decodes the record
    pub fn classify_into<T: DeserializeOwned>(
        &self,
        statement: &'static str,
        outcome: &QueryOutcome,
    ) -> ModelResult<T> {
        let record = self.classify(statement, outcome)?;
        T::deserialize(&record).map_err(|e| ModelError::Store(StoreError::Decode(e.to_string())))
    }
}
