//! Requirements and comparators

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::errors::PathResult;
use super::path::{IntoPathSpec, PathSpec, Resolved};

/// A pure predicate over the two resolved sides of a requirement
pub type Comparator = Arc<dyn Fn(&Resolved<'_>, &Resolved<'_>) -> bool + Send + Sync>;

/// Declares that two values drawn from a request must be consistent.
///
/// Without a custom comparator the two sides must be strictly equal.
#[derive(Clone)]
pub struct Requirement {
    left: PathSpec,
    right: PathSpec,
    compare: Option<Comparator>,
    message: Option<String>,
}

impl Requirement {
    /// Requirement between two paths; fails on a malformed path
    pub fn new(left: impl IntoPathSpec, right: impl IntoPathSpec) -> PathResult<Self> {
        Ok(Self {
            left: left.into_path_spec()?,
            right: right.into_path_spec()?,
            compare: None,
            message: None,
        })
    }

    /// Replaces strict equality with a custom predicate
    pub fn compare(mut self, compare: Comparator) -> Self {
        self.compare = Some(compare);
        self
    }

    /// Replaces the default "<left> should match <right>" message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn left(&self) -> &PathSpec {
        &self.left
    }

    pub fn right(&self) -> &PathSpec {
        &self.right
    }

    /// Evaluates the requirement on resolved values
    pub fn holds(&self, left: &Resolved<'_>, right: &Resolved<'_>) -> bool {
        match &self.compare {
            Some(compare) => compare(left, right),
            None => strictly_equal(left, right),
        }
    }

    /// Message reported when the requirement does not hold
    pub fn failure_message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("{} should match {}", self.left, self.right),
        }
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("left", &self.left.to_string())
            .field("right", &self.right.to_string())
            .field("custom_compare", &self.compare.is_some())
            .field("message", &self.message)
            .finish()
    }
}

/// Strict equality: same shape, same values; a missing value only equals
/// another missing value
pub fn strictly_equal(left: &Resolved<'_>, right: &Resolved<'_>) -> bool {
    left == right
}

/// Ready-made comparators used by endpoint declarations
pub mod compare {
    use super::*;

    /// Sides must not be strictly equal
    pub fn different() -> Comparator {
        Arc::new(|left: &Resolved<'_>, right: &Resolved<'_>| !strictly_equal(left, right))
    }

    /// Left is a string equal to the right-hand strings joined by `separator`
    pub fn joined(separator: &'static str) -> Comparator {
        Arc::new(move |left: &Resolved<'_>, right: &Resolved<'_>| {
            let parts = match right {
                Resolved::Many(values) => values,
                Resolved::One(_) => return false,
            };
            let parts: Option<Vec<&str>> = parts
                .iter()
                .map(|value| value.and_then(Value::as_str))
                .collect();
            match (left.as_str(), parts) {
                (Some(whole), Some(parts)) => whole == parts.join(separator),
                _ => false,
            }
        })
    }

    /// Left equals at least one of the right-hand values
    pub fn member_of() -> Comparator {
        Arc::new(|left: &Resolved<'_>, right: &Resolved<'_>| {
            let needle = match left {
                Resolved::One(Some(value)) => Some(*value),
                _ => return false,
            };
            match right {
                Resolved::Many(values) => values.iter().any(|value| *value == needle),
                Resolved::One(value) => *value == needle,
            }
        })
    }
}
