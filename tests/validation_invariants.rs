//! Validation Invariant Tests
//!
//! Structural validation against the built-in endpoint schemas:
//! - Every missing required field is reported with its path
//! - Independent violations are all reported, never just the first
//! - Consistency rules never run on a structurally invalid request
//! - Validation is deterministic and does not touch the request

use ditapi::gate::{Endpoint, GateResult, Gates, Rejection};
use ditapi::request::{parse_query, AuthInfo, RequestData};
use ditapi::schema::{Keyword, SchemaRegistry, StructuralValidator};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin().unwrap()
}

fn alice() -> AuthInfo {
    AuthInfo::verified("alice")
}

// =============================================================================
// Structural Completeness
// =============================================================================

/// A message body without `body` names `body.body`.
#[test]
fn test_missing_required_field_is_named() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice()).with_body(json!({ "to": { "username": "bob" } }));

    let result = validator.validate("postMessages", &request.shape()).unwrap();

    assert!(!result.valid);
    assert_eq!(result.paths(), vec!["body.body"]);
    assert_eq!(result.errors[0].keyword, Keyword::Required);
    assert!(result.errors[0].value.is_none());
}

/// A request without any body reports the body itself as missing.
#[test]
fn test_missing_body_is_reported() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice());

    let result = validator.validate("postMessages", &request.shape()).unwrap();

    assert_eq!(result.paths(), vec!["body"]);
}

/// Missing nested fields carry their full path.
#[test]
fn test_nested_missing_field_path() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice()).with_body(json!({ "body": "hi", "to": {} }));

    let result = validator.validate("postMessages", &request.shape()).unwrap();

    assert_eq!(result.paths(), vec!["body.to.username"]);
}

// =============================================================================
// No Partial Short-Circuit
// =============================================================================

/// A dit without `title` and without `detail` reports both.
#[test]
fn test_two_missing_fields_both_reported() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice()).with_body(json!({}));

    let result = validator.validate("postDits", &request.shape()).unwrap();

    let paths = result.paths();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&"body.title"));
    assert!(paths.contains(&"body.detail"));
}

/// Violations of different kinds in different fields are all reported.
#[test]
fn test_independent_violations_all_reported() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice()).with_body(json!({
        "trust": 3,
        "reference": "met her",
        "to": { "username": "Bob!" },
        "extra": true
    }));

    let result = validator.validate("postContacts", &request.shape()).unwrap();

    let paths = result.paths();
    assert!(paths.contains(&"body.trust"));
    assert!(paths.contains(&"body.to.username"));
    assert!(paths.contains(&"body.extra"));
}

/// A wrong type is one error, not a cascade of string keyword errors.
#[test]
fn test_type_mismatch_is_single_error() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let request = RequestData::new(alice()).with_body(json!({ "title": 42, "detail": "" }));

    let result = validator.validate("postDits", &request.shape()).unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, "body.title");
    assert_eq!(result.errors[0].keyword, Keyword::Type);
}

/// Query parameters are validated after parsing into nested values.
#[test]
fn test_page_limit_bounds() {
    let registry = registry();
    let validator = StructuralValidator::new(&registry);
    let query = parse_query([("filter[withTags]", "tag-a"), ("page[limit]", "21")]);
    let request = RequestData::new(AuthInfo::anonymous()).with_query(query);

    let result = validator.validate("getDits", &request.shape()).unwrap();

    assert!(!result.valid);
}

/// Usernames and tagnames may be all digits; filters must still find them.
#[test]
fn test_all_digit_names_accepted_in_filters() {
    let gates = Gates::build(&registry()).unwrap();
    let anonymous = || RequestData::new(AuthInfo::anonymous());

    for (endpoint, key, value) in [
        (Endpoint::GetDits, "filter[creators]", "42,ab"),
        (Endpoint::GetDits, "filter[withTags]", "42"),
        (Endpoint::GetDits, "filter[highlyVoted]", "3"),
    ] {
        let request = anonymous().with_query(parse_query([(key, value)]));
        assert!(gates.get(endpoint).check(&request).is_accept(), "{}={}", key, value);
    }

    let messages = RequestData::new(alice()).with_query(parse_query([("filter[with]", "42")]));
    assert!(gates.get(Endpoint::GetMessages).check(&messages).is_accept());
}

#[test]
fn test_vote_threshold_must_be_digits() {
    let gates = Gates::build(&registry()).unwrap();
    for threshold in ["-1", "many", ""] {
        let request = RequestData::new(AuthInfo::anonymous())
            .with_query(parse_query([("filter[highlyVoted]", threshold)]));
        assert!(!gates.get(Endpoint::GetDits).check(&request).is_accept(), "{:?}", threshold);
    }
}

// =============================================================================
// Order Invariant
// =============================================================================

/// Body id disagrees with the path id AND the title has the wrong type:
/// only the structural error is reported.
#[test]
fn test_structural_failure_hides_consistency_failure() {
    let gates = Gates::build(&registry()).unwrap();
    let request = RequestData::new(alice())
        .with_params([("id", "8")])
        .with_body(json!({ "id": "7", "title": 5 }));

    match gates.get(Endpoint::PatchDit).check(&request) {
        GateResult::Reject(Rejection::Structural(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected structural rejection, got {:?}", other),
    }
}

/// Once the shape is fixed the same mismatch surfaces as a consistency error.
#[test]
fn test_consistency_runs_on_valid_shape() {
    let gates = Gates::build(&registry()).unwrap();
    let request = RequestData::new(alice())
        .with_params([("id", "8")])
        .with_body(json!({ "id": "7", "title": "better title" }));

    match gates.get(Endpoint::PatchDit).check(&request) {
        GateResult::Reject(Rejection::Consistency(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].fields, ["body.id".to_string(), "params.id".to_string()]);
        }
        other => panic!("expected consistency rejection, got {:?}", other),
    }
}

#[test]
fn test_consistent_request_accepted() {
    let gates = Gates::build(&registry()).unwrap();
    let request = RequestData::new(alice())
        .with_params([("id", "8")])
        .with_body(json!({ "id": "8", "title": "better title", "detail": "more" }));

    assert!(gates.get(Endpoint::PatchDit).check(&request).is_accept());
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_validation_is_deterministic() {
    let gates = Gates::build(&registry()).unwrap();
    let request = RequestData::new(alice()).with_body(json!({ "title": "" }));
    let first = gates.get(Endpoint::PostDits).check(&request);

    for _ in 0..100 {
        assert_eq!(gates.get(Endpoint::PostDits).check(&request), first);
    }
}

#[test]
fn test_request_is_not_mutated() {
    let gates = Gates::build(&registry()).unwrap();
    let request = RequestData::new(alice())
        .with_params([("username", "alice")])
        .with_body(json!({ "id": "alice", "givenName": "Alice" }));
    let before = request.clone();

    gates.get(Endpoint::PatchUser).check(&request);

    assert_eq!(request, before);
}

// =============================================================================
// Schema Directory
// =============================================================================

#[test]
fn test_schema_dir_replaces_builtin_set() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("notes.json"),
        r#"{
            "shared": { "name": { "type": "string", "minLength": 2 } },
            "postNote": {
                "type": "object",
                "properties": { "body": { "type": "object",
                    "properties": { "name": { "$ref": "shared#/name" } },
                    "required": ["name"] } },
                "required": ["body"]
            }
        }"#,
    )
    .unwrap();

    let registry = SchemaRegistry::load_dir(dir.path()).unwrap();
    let validator = StructuralValidator::new(&registry);

    assert_eq!(registry.len(), 2);
    assert!(validator.validate("postNote", &json!({ "body": { "name": "ok" } })).unwrap().valid);
    let result = validator.validate("postNote", &json!({ "body": { "name": "x" } })).unwrap();
    assert_eq!(result.paths(), vec!["body.name"]);
    assert_eq!(
        validator.validate("postMessages", &json!({})).unwrap_err().code(),
        "DIT_UNKNOWN_SCHEMA"
    );
}

#[test]
fn test_schema_dir_with_dangling_reference_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("broken.json"),
        r#"{ "postNote": { "$ref": "missing#/name" } }"#,
    )
    .unwrap();

    let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
    assert_eq!(err.code(), "DIT_SCHEMA_UNRESOLVED_REF");
    assert!(err.is_fatal());
}
