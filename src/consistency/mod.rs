//! Cross-field consistency checks
//!
//! Structural schemas cannot say "the id in the body must equal the id in
//! the URL" or "you cannot send a contact request to yourself". A
//! `Requirement` pairs two field paths (or a path and a list of paths) with a
//! predicate; `check_all` evaluates every requirement of an endpoint and
//! collects all failures.
//!
//! Requirements only ever run on structurally valid requests.

mod checker;
mod errors;
mod path;
mod requirement;

pub use checker::{check_all, ConsistencyResult};
pub use errors::{ConsistencyError, PathError, PathResult};
pub use path::{FieldPath, IntoPathSpec, PathSpec, RequestPart, Resolved, Segment};
pub use requirement::{compare, strictly_equal, Comparator, Requirement};
