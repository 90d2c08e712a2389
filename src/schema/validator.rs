//! Structural validator
//!
//! Checks a request object against a compiled schema and reports every
//! violation it finds in a single pass. Keywords that only apply to one
//! instance type (`pattern`, `minimum`, `items`, ...) are skipped for values
//! of other types, so a type mismatch yields exactly one `type` error.
//!
//! The validator knows nothing about authentication or business rules.

use serde::Serialize;
use serde_json::Value;

use super::errors::{Keyword, SchemaResult, StructuralError};
use super::registry::SchemaRegistry;
use super::types::{type_of, Schema};

/// Outcome of validating one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<StructuralError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<StructuralError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Paths of all reported errors, in report order
    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}

/// Validator backed by a schema registry
pub struct StructuralValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates an instance against the named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownSchema` when the name is not registered;
    /// shape violations are reported in the `ValidationResult`, never as `Err`.
    pub fn validate(&self, schema_name: &str, instance: &Value) -> SchemaResult<ValidationResult> {
        let schema = self.registry.get(schema_name)?;
        Ok(validate_schema(&schema, instance))
    }
}

/// Validates an instance against an already resolved schema
pub fn validate_schema(schema: &Schema, instance: &Value) -> ValidationResult {
    let mut errors = Vec::new();
    check(schema, instance, "", &mut errors);
    ValidationResult::from_errors(errors)
}

fn check(schema: &Schema, value: &Value, path: &str, errors: &mut Vec<StructuralError>) {
    if !schema.types.is_empty() && !schema.types.iter().any(|t| t.matches(value)) {
        let expected: Vec<&str> = schema.types.iter().map(|t| t.as_str()).collect();
        errors.push(StructuralError::new(
            path,
            Keyword::Type,
            format!(
                "{} should be {} (got {})",
                name(path),
                expected.join(" or "),
                type_of(value)
            ),
            Some(value.clone()),
        ));
    }

    if let Some(allowed) = &schema.enumeration {
        if !allowed.contains(value) {
            let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
            errors.push(StructuralError::new(
                path,
                Keyword::Enum,
                format!("{} should be one of [{}]", name(path), listed.join(", ")),
                Some(value.clone()),
            ));
        }
    }

    match value {
        Value::String(text) => check_string(schema, text, value, path, errors),
        Value::Number(number) => {
            if let Some(n) = number.as_f64() {
                check_number(schema, n, value, path, errors);
            }
        }
        Value::Array(items) => check_array(schema, items, value, path, errors),
        Value::Object(obj) => check_object(schema, obj, path, errors),
        _ => {}
    }

    if !schema.one_of.is_empty() {
        let matched = schema
            .one_of
            .iter()
            .filter(|alternative| conforms(alternative, value, path))
            .count();
        if matched != 1 {
            errors.push(StructuralError::new(
                path,
                Keyword::OneOf,
                format!(
                    "{} should match exactly one allowed shape (matched {})",
                    name(path),
                    matched
                ),
                Some(value.clone()),
            ));
        }
    }

    if !schema.any_of.is_empty() && !schema.any_of.iter().any(|alt| conforms(alt, value, path)) {
        errors.push(StructuralError::new(
            path,
            Keyword::AnyOf,
            format!("{} should match at least one allowed shape", name(path)),
            Some(value.clone()),
        ));
    }
}

fn conforms(schema: &Schema, value: &Value, path: &str) -> bool {
    let mut scratch = Vec::new();
    check(schema, value, path, &mut scratch);
    scratch.is_empty()
}

fn check_string(schema: &Schema, text: &str, value: &Value, path: &str, errors: &mut Vec<StructuralError>) {
    let length = text.chars().count();

    if let Some(min) = schema.min_length {
        if length < min {
            errors.push(StructuralError::new(
                path,
                Keyword::MinLength,
                format!("{} should be at least {} characters long", name(path), min),
                Some(value.clone()),
            ));
        }
    }

    if let Some(max) = schema.max_length {
        if length > max {
            errors.push(StructuralError::new(
                path,
                Keyword::MaxLength,
                format!("{} should be at most {} characters long", name(path), max),
                Some(value.clone()),
            ));
        }
    }

    if let Some(pattern) = &schema.pattern {
        if !pattern.is_match(text) {
            errors.push(StructuralError::new(
                path,
                Keyword::Pattern,
                format!("{} should match pattern {}", name(path), pattern.source()),
                Some(value.clone()),
            ));
        }
    }
}

fn check_number(schema: &Schema, n: f64, value: &Value, path: &str, errors: &mut Vec<StructuralError>) {
    if let Some(min) = schema.minimum {
        if n < min {
            errors.push(StructuralError::new(
                path,
                Keyword::Minimum,
                format!("{} should be >= {}", name(path), min),
                Some(value.clone()),
            ));
        }
    }

    if let Some(max) = schema.maximum {
        if n > max {
            errors.push(StructuralError::new(
                path,
                Keyword::Maximum,
                format!("{} should be <= {}", name(path), max),
                Some(value.clone()),
            ));
        }
    }
}

fn check_array(schema: &Schema, items: &[Value], value: &Value, path: &str, errors: &mut Vec<StructuralError>) {
    if let Some(min) = schema.min_items {
        if items.len() < min {
            errors.push(StructuralError::new(
                path,
                Keyword::MinItems,
                format!("{} should have at least {} items", name(path), min),
                Some(value.clone()),
            ));
        }
    }

    if let Some(max) = schema.max_items {
        if items.len() > max {
            errors.push(StructuralError::new(
                path,
                Keyword::MaxItems,
                format!("{} should have at most {} items", name(path), max),
                Some(value.clone()),
            ));
        }
    }

    if let Some(item_schema) = &schema.items {
        for (i, item) in items.iter().enumerate() {
            check(item_schema, item, &format!("{}[{}]", path, i), errors);
        }
    }
}

fn check_object(
    schema: &Schema,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    errors: &mut Vec<StructuralError>,
) {
    for field in &schema.required {
        if !obj.contains_key(field) {
            errors.push(StructuralError::missing(make_path(path, field)));
        }
    }

    if schema.is_closed() {
        for (key, value) in obj {
            if !schema.properties.contains_key(key) {
                errors.push(StructuralError::unexpected(make_path(path, key), value));
            }
        }
    }

    for (key, property) in &schema.properties {
        if let Some(child) = obj.get(key) {
            check(property, child, &make_path(path, key), errors);
        }
    }
}

/// Creates a field path from prefix and field name
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn name(path: &str) -> &str {
    if path.is_empty() {
        "request"
    } else {
        path
    }
}
