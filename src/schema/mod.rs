//! Request schemas
//!
//! Every endpoint is described by a named, JSON-Schema-like document covering
//! the `body`, `params` and `query` parts of a request. Documents are
//! compiled once at boot into a read-only `SchemaRegistry`; the
//! `StructuralValidator` checks a request against one of them and collects
//! every shape violation in a single pass.
//!
//! Supported keywords: `type`, `properties`, `required`,
//! `additionalProperties` (boolean), `items`, `enum`, `pattern`,
//! `minLength`/`maxLength`, `minimum`/`maximum` (inclusive),
//! `minItems`/`maxItems`, `oneOf`, `anyOf`, `$ref`.

mod errors;
mod registry;
mod types;
mod validator;

pub use errors::{Keyword, SchemaError, SchemaResult, Severity, StructuralError};
pub use registry::SchemaRegistry;
pub use types::{JsonType, Schema};
pub use validator::{validate_schema, StructuralValidator, ValidationResult};
