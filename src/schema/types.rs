//! Compiled schema nodes
//!
//! A `Schema` is the boot-time compiled form of a JSON-Schema-like document.
//! Every `$ref` has already been replaced by a shared `Arc<Schema>` and every
//! `pattern` has been compiled, so validation never touches strings that
//! name other schemas.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

/// JSON instance types understood by the `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
}

impl JsonType {
    /// Parses a `type` keyword value
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(JsonType::String),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "boolean" => Some(JsonType::Boolean),
            "null" => Some(JsonType::Null),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    /// Returns the keyword spelling of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    /// Whether a JSON value is an instance of this type.
    ///
    /// `integer` accepts any number without a fractional part, so `2.0`
    /// is an integer and `2.5` is not.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => true,
                Value::Number(n) => n.as_f64().map_or(false, |f| f.fract() == 0.0),
                _ => false,
            },
            JsonType::Boolean => value.is_boolean(),
            JsonType::Null => value.is_null(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the type name of a JSON value for error messages
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A compiled `pattern` keyword
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: String, regex: Regex) -> Self {
        Self { source, regex }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

/// One compiled schema node.
///
/// Absent keywords impose no constraint. `additional_properties` defaults to
/// open, as in JSON Schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub types: Vec<JsonType>,
    pub properties: BTreeMap<String, Arc<Schema>>,
    pub required: Vec<String>,
    pub additional_properties: bool,
    pub items: Option<Arc<Schema>>,
    pub enumeration: Option<Vec<Value>>,
    pub pattern: Option<Pattern>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub one_of: Vec<Arc<Schema>>,
    pub any_of: Vec<Arc<Schema>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: true,
            items: None,
            enumeration: None,
            pattern: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
            one_of: Vec::new(),
            any_of: Vec::new(),
        }
    }
}

impl Schema {
    /// A schema that accepts every instance
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether this node declares a closed property set
    pub fn is_closed(&self) -> bool {
        !self.additional_properties
    }
}
