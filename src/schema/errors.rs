//! Schema error types
//!
//! Error codes:
//! - DIT_UNKNOWN_SCHEMA (REJECT, programming error at lookup)
//! - DIT_SCHEMA_DUPLICATE (FATAL)
//! - DIT_SCHEMA_UNRESOLVED_REF (FATAL)
//! - DIT_SCHEMA_REF_CYCLE (FATAL)
//! - DIT_SCHEMA_INVALID_PATTERN (FATAL)
//! - DIT_SCHEMA_MALFORMED (FATAL)

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The caller asked for something that is not there
    Reject,
    /// The schema set is unusable; boot must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised while registering or looking up schemas
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("schema '{0}' is not registered")]
    UnknownSchema(String),

    #[error("schema '{0}' is registered twice")]
    DuplicateSchema(String),

    #[error("unresolved reference '{reference}' in schema '{schema}'")]
    UnresolvedReference { schema: String, reference: String },

    #[error("reference cycle through '{0}'")]
    ReferenceCycle(String),

    #[error("invalid pattern '{pattern}' in schema '{schema}': {reason}")]
    InvalidPattern {
        schema: String,
        pattern: String,
        reason: String,
    },

    #[error("malformed schema '{schema}': {reason}")]
    MalformedSchema { schema: String, reason: String },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnknownSchema(_) => "DIT_UNKNOWN_SCHEMA",
            SchemaError::DuplicateSchema(_) => "DIT_SCHEMA_DUPLICATE",
            SchemaError::UnresolvedReference { .. } => "DIT_SCHEMA_UNRESOLVED_REF",
            SchemaError::ReferenceCycle(_) => "DIT_SCHEMA_REF_CYCLE",
            SchemaError::InvalidPattern { .. } => "DIT_SCHEMA_INVALID_PATTERN",
            SchemaError::MalformedSchema { .. } => "DIT_SCHEMA_MALFORMED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            SchemaError::UnknownSchema(_) => Severity::Reject,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub(crate) fn malformed(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::MalformedSchema {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// The keyword a structural error was raised by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Keyword {
    Required,
    AdditionalProperties,
    Type,
    Enum,
    Pattern,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    MinItems,
    MaxItems,
    OneOf,
    AnyOf,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Required => "required",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::Type => "type",
            Keyword::Enum => "enum",
            Keyword::Pattern => "pattern",
            Keyword::MinLength => "minLength",
            Keyword::MaxLength => "maxLength",
            Keyword::Minimum => "minimum",
            Keyword::Maximum => "maximum",
            Keyword::MinItems => "minItems",
            Keyword::MaxItems => "maxItems",
            Keyword::OneOf => "oneOf",
            Keyword::AnyOf => "anyOf",
        }
    }
}

/// One shape violation found in a request.
///
/// `path` addresses the offending field inside the validated request
/// (e.g. `body.to.username`, `query.filter.withTags[1]`); `value` is the
/// offending value, absent when the field itself is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralError {
    pub path: String,
    pub keyword: Keyword,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl StructuralError {
    pub fn new(
        path: impl Into<String>,
        keyword: Keyword,
        message: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            path: path.into(),
            keyword,
            message: message.into(),
            value,
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("{} is required", display_path(&path));
        Self::new(path, Keyword::Required, message, None)
    }

    pub fn unexpected(path: impl Into<String>, value: &Value) -> Self {
        let path = path.into();
        let message = format!("{} is not allowed", display_path(&path));
        Self::new(path, Keyword::AdditionalProperties, message, Some(value.clone()))
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.keyword.as_str(), self.message)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "request"
    } else {
        path
    }
}
