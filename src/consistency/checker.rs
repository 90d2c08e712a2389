//! Cross-field consistency checker

use serde::Serialize;
use serde_json::Value;

use super::errors::ConsistencyError;
use super::requirement::Requirement;

/// Outcome of checking a request against a list of requirements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyResult {
    pub valid: bool,
    pub errors: Vec<ConsistencyError>,
}

/// Evaluates every requirement against the request view and reports all
/// failures together.
///
/// `request` is the full view `{body, params, query, auth}`; it is only read.
pub fn check_all(requirements: &[Requirement], request: &Value) -> ConsistencyResult {
    let errors: Vec<ConsistencyError> = requirements
        .iter()
        .filter_map(|requirement| check_one(requirement, request))
        .collect();

    ConsistencyResult {
        valid: errors.is_empty(),
        errors,
    }
}

fn check_one(requirement: &Requirement, request: &Value) -> Option<ConsistencyError> {
    let left = requirement.left().resolve(request);
    let right = requirement.right().resolve(request);

    if requirement.holds(&left, &right) {
        return None;
    }

    Some(ConsistencyError {
        fields: [requirement.left().to_string(), requirement.right().to_string()],
        values: [left.to_value(), right.to_value()],
        message: requirement.failure_message(),
    })
}
