//! Per-endpoint request gate

use std::sync::Arc;

use serde::Serialize;

use crate::consistency::{check_all, ConsistencyError, Requirement};
use crate::request::RequestData;
use crate::schema::{validate_schema, Schema, SchemaRegistry, StructuralError};

use super::errors::{GateBuildError, GateBuildResult};

/// Why a request was turned away
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "errors", rename_all = "camelCase")]
pub enum Rejection {
    Structural(Vec<StructuralError>),
    Consistency(Vec<ConsistencyError>),
}

impl Rejection {
    pub fn len(&self) -> usize {
        match self {
            Rejection::Structural(errors) => errors.len(),
            Rejection::Consistency(errors) => errors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Verdict of a gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    Accept,
    Reject(Rejection),
}

impl GateResult {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateResult::Accept)
    }
}

/// Structural schema plus consistency requirements of one endpoint.
///
/// Structural validation always runs first. Requirements are only evaluated
/// on requests whose shape is valid, so a request that is both malformed
/// and inconsistent reports only its structural errors.
#[derive(Debug, Clone)]
pub struct Gate {
    schema_name: &'static str,
    schema: Arc<Schema>,
    requirements: Vec<Requirement>,
}

impl Gate {
    /// Builds a gate; an unregistered schema name fails immediately
    pub fn build(
        registry: &SchemaRegistry,
        schema_name: &'static str,
        requirements: Vec<Requirement>,
    ) -> GateBuildResult<Self> {
        let schema = registry.get(schema_name).map_err(|source| GateBuildError::Schema {
            endpoint: schema_name,
            source,
        })?;

        Ok(Self {
            schema_name,
            schema,
            requirements,
        })
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Runs the gate; never mutates the request
    pub fn check(&self, request: &RequestData) -> GateResult {
        let structural = validate_schema(&self.schema, &request.shape());
        if !structural.valid {
            return GateResult::Reject(Rejection::Structural(structural.errors));
        }

        if self.requirements.is_empty() {
            return GateResult::Accept;
        }

        let consistency = check_all(&self.requirements, &request.view());
        if !consistency.valid {
            return GateResult::Reject(Rejection::Consistency(consistency.errors));
        }

        GateResult::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AuthInfo;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn registry() -> SchemaRegistry {
        let documents: BTreeMap<String, Value> = serde_json::from_value(json!({
            "patchThing": {
                "type": "object",
                "properties": {
                    "params": {
                        "type": "object",
                        "properties": { "id": { "type": "string", "pattern": "^[0-9]+$" } },
                        "required": ["id"]
                    },
                    "body": {
                        "type": "object",
                        "properties": { "id": { "type": "string", "pattern": "^[0-9]+$" } },
                        "required": ["id"]
                    }
                },
                "required": ["params", "body"]
            }
        }))
        .unwrap();
        SchemaRegistry::register(documents).unwrap()
    }

    fn gate() -> Gate {
        Gate::build(
            &registry(),
            "patchThing",
            vec![Requirement::new("params.id", "body.id").unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_schema_fails_build() {
        let err = Gate::build(&registry(), "nope", vec![]).unwrap_err();
        assert_eq!(err.code(), "DIT_UNKNOWN_SCHEMA");
        assert_eq!(err.endpoint(), "nope");
    }

    #[test]
    fn test_accept() {
        let request = RequestData::new(AuthInfo::verified("alice"))
            .with_params([("id", "12")])
            .with_body(json!({ "id": "12" }));
        assert_eq!(gate().check(&request), GateResult::Accept);
    }

    #[test]
    fn test_consistency_rejection() {
        let request = RequestData::new(AuthInfo::verified("alice"))
            .with_params([("id", "12")])
            .with_body(json!({ "id": "13" }));

        match gate().check(&request) {
            GateResult::Reject(Rejection::Consistency(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "params.id should match body.id");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_structural_errors_hide_consistency_errors() {
        let request = RequestData::new(AuthInfo::verified("alice"))
            .with_params([("id", "12")])
            .with_body(json!({ "id": "abc" }));

        match gate().check(&request) {
            GateResult::Reject(Rejection::Structural(errors)) => {
                assert!(errors.iter().all(|e| e.path == "body.id"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_request_is_not_mutated() {
        let request = RequestData::new(AuthInfo::anonymous())
            .with_params([("id", "1")])
            .with_body(json!({ "id": "2" }));
        let before = request.clone();
        let _ = gate().check(&request);
        assert_eq!(request, before);
    }
}
