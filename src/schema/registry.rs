//! Schema registry
//!
//! Schema documents arrive as raw JSON keyed by name. `SchemaRegistry::register`
//! compiles all of them once: `$ref` pointers are followed and replaced by
//! shared `Arc<Schema>` nodes, patterns are compiled, and any reference that
//! cannot be resolved aborts the whole registration.
//!
//! References take the form `<name>#<json-pointer>` (`definitions#/user/username`),
//! `<name>` for a whole document, or `#<json-pointer>` inside the same document.
//!
//! After construction the registry is never mutated, so it is shared across
//! request handlers behind an `Arc` without locking.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{JsonType, Pattern, Schema};

/// Built-in schema documents, one file per resource group
const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    ("definitions.json", include_str!("../../schemas/definitions.json")),
    ("users.json", include_str!("../../schemas/users.json")),
    ("tags.json", include_str!("../../schemas/tags.json")),
    ("contacts.json", include_str!("../../schemas/contacts.json")),
    ("messages.json", include_str!("../../schemas/messages.json")),
    ("dits.json", include_str!("../../schemas/dits.json")),
    ("comments.json", include_str!("../../schemas/comments.json")),
];

/// Read-only collection of compiled schemas, addressable by name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Compiles a complete set of schema documents.
    ///
    /// Fails on the first unresolved reference, reference cycle, invalid
    /// pattern or malformed keyword.
    pub fn register(documents: BTreeMap<String, Value>) -> SchemaResult<Self> {
        let mut compiler = Compiler::new(&documents);
        let mut schemas = HashMap::with_capacity(documents.len());

        for (name, document) in &documents {
            let schema = compiler.compile(name, document)?;
            schemas.insert(name.clone(), schema);
        }

        Ok(Self { schemas })
    }

    /// Registry built from the schema files compiled into the binary
    pub fn builtin() -> SchemaResult<Self> {
        let mut documents = BTreeMap::new();
        for (file, content) in BUILTIN_DOCUMENTS {
            collect_documents(file, content, &mut documents)?;
        }
        Self::register(documents)
    }

    /// Registry built from every `*.json` file in a directory.
    ///
    /// Each file holds a JSON object mapping schema names to documents.
    pub fn load_dir(dir: &Path) -> SchemaResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            SchemaError::malformed(dir.display().to_string(), format!("failed to read directory: {}", e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(dir.display().to_string(), format!("failed to read entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = BTreeMap::new();
        for path in paths {
            let content = fs::read_to_string(&path).map_err(|e| {
                SchemaError::malformed(path.display().to_string(), format!("failed to read file: {}", e))
            })?;
            collect_documents(&path.display().to_string(), &content, &mut documents)?;
        }

        Self::register(documents)
    }

    /// Looks up a schema by name
    pub fn get(&self, name: &str) -> SchemaResult<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Parses one schema file and merges its documents, rejecting duplicates
fn collect_documents(
    origin: &str,
    content: &str,
    documents: &mut BTreeMap<String, Value>,
) -> SchemaResult<()> {
    let parsed: Map<String, Value> = serde_json::from_str(content)
        .map_err(|e| SchemaError::malformed(origin, format!("invalid JSON: {}", e)))?;

    for (name, document) in parsed {
        if documents.contains_key(&name) {
            return Err(SchemaError::DuplicateSchema(name));
        }
        documents.insert(name, document);
    }
    Ok(())
}

/// Turns raw documents into compiled nodes, sharing every referenced subtree
struct Compiler<'a> {
    documents: &'a BTreeMap<String, Value>,
    resolved: HashMap<String, Arc<Schema>>,
    in_progress: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn new(documents: &'a BTreeMap<String, Value>) -> Self {
        Self {
            documents,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn compile(&mut self, owner: &str, node: &Value) -> SchemaResult<Arc<Schema>> {
        let obj = match node {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(Arc::new(Schema::any())),
            _ => return Err(SchemaError::malformed(owner, "schema node must be an object")),
        };

        if let Some(reference) = obj.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::malformed(owner, "$ref must be a string"))?;
            return self.resolve(owner, reference);
        }

        let mut schema = Schema::any();

        if let Some(types) = obj.get("type") {
            schema.types = parse_types(owner, types)?;
        }

        if let Some(properties) = obj.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| SchemaError::malformed(owner, "properties must be an object"))?;
            for (key, child) in properties {
                let compiled = self.compile(owner, child)?;
                schema.properties.insert(key.clone(), compiled);
            }
        }

        if let Some(required) = obj.get("required") {
            schema.required = string_list(owner, "required", required)?;
        }

        if let Some(additional) = obj.get("additionalProperties") {
            schema.additional_properties = additional.as_bool().ok_or_else(|| {
                SchemaError::malformed(owner, "additionalProperties must be a boolean")
            })?;
        }

        if let Some(items) = obj.get("items") {
            schema.items = Some(self.compile(owner, items)?);
        }

        if let Some(values) = obj.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| SchemaError::malformed(owner, "enum must be an array"))?;
            schema.enumeration = Some(values.clone());
        }

        if let Some(pattern) = obj.get("pattern") {
            let source = pattern
                .as_str()
                .ok_or_else(|| SchemaError::malformed(owner, "pattern must be a string"))?;
            let regex = Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
                schema: owner.to_string(),
                pattern: source.to_string(),
                reason: e.to_string(),
            })?;
            schema.pattern = Some(Pattern::new(source.to_string(), regex));
        }

        schema.min_length = size(owner, obj, "minLength")?;
        schema.max_length = size(owner, obj, "maxLength")?;
        schema.min_items = size(owner, obj, "minItems")?;
        schema.max_items = size(owner, obj, "maxItems")?;
        schema.minimum = bound(owner, obj, "minimum")?;
        schema.maximum = bound(owner, obj, "maximum")?;

        if let Some(alternatives) = obj.get("oneOf") {
            schema.one_of = self.compile_all(owner, "oneOf", alternatives)?;
        }
        if let Some(alternatives) = obj.get("anyOf") {
            schema.any_of = self.compile_all(owner, "anyOf", alternatives)?;
        }

        Ok(Arc::new(schema))
    }

    fn compile_all(&mut self, owner: &str, keyword: &str, value: &Value) -> SchemaResult<Vec<Arc<Schema>>> {
        let list = value
            .as_array()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| SchemaError::malformed(owner, format!("{} must be a non-empty array", keyword)))?;
        list.iter().map(|node| self.compile(owner, node)).collect()
    }

    fn resolve(&mut self, owner: &str, reference: &str) -> SchemaResult<Arc<Schema>> {
        let (name, pointer) = match reference.split_once('#') {
            Some(("", pointer)) => (owner, pointer),
            Some((name, pointer)) => (name, pointer),
            None => (reference, ""),
        };
        let key = format!("{}#{}", name, pointer);

        if let Some(schema) = self.resolved.get(&key) {
            return Ok(Arc::clone(schema));
        }
        if self.in_progress.contains(&key) {
            return Err(SchemaError::ReferenceCycle(key));
        }

        let unresolved = || SchemaError::UnresolvedReference {
            schema: owner.to_string(),
            reference: reference.to_string(),
        };
        let documents = self.documents;
        let document = documents.get(name).ok_or_else(unresolved)?;
        let target = document.pointer(pointer).ok_or_else(unresolved)?;

        self.in_progress.push(key.clone());
        let compiled = self.compile(name, target);
        self.in_progress.pop();

        let compiled = compiled?;
        self.resolved.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}

fn parse_types(owner: &str, value: &Value) -> SchemaResult<Vec<JsonType>> {
    let names = match value {
        Value::String(name) => vec![name.clone()],
        Value::Array(_) => string_list(owner, "type", value)?,
        _ => return Err(SchemaError::malformed(owner, "type must be a string or an array")),
    };
    names
        .iter()
        .map(|name| {
            JsonType::parse(name)
                .ok_or_else(|| SchemaError::malformed(owner, format!("unknown type '{}'", name)))
        })
        .collect()
}

fn string_list(owner: &str, keyword: &str, value: &Value) -> SchemaResult<Vec<String>> {
    let invalid = || SchemaError::malformed(owner, format!("{} must be an array of strings", keyword));
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn size(owner: &str, obj: &Map<String, Value>, keyword: &str) -> SchemaResult<Option<usize>> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| SchemaError::malformed(owner, format!("{} must be a non-negative integer", keyword))),
    }
}

fn bound(owner: &str, obj: &Map<String, Value>, keyword: &str) -> SchemaResult<Option<f64>> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| SchemaError::malformed(owner, format!("{} must be a number", keyword))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn documents(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::register(documents(json!({
            "getTag": { "type": "object" }
        })))
        .unwrap();

        assert!(registry.contains("getTag"));
        assert_eq!(registry.get("getTag").unwrap().types, vec![JsonType::Object]);
    }

    #[test]
    fn test_unknown_schema_lookup_fails() {
        let registry = SchemaRegistry::default();
        let err = registry.get("nope").unwrap_err();
        assert_eq!(err.code(), "DIT_UNKNOWN_SCHEMA");
    }

    #[test]
    fn test_cross_document_reference_is_shared() {
        let registry = SchemaRegistry::register(documents(json!({
            "definitions": { "user": { "username": { "type": "string", "minLength": 2 } } },
            "a": { "properties": { "u": { "$ref": "definitions#/user/username" } } },
            "b": { "properties": { "v": { "$ref": "definitions#/user/username" } } }
        })))
        .unwrap();

        let a = registry.get("a").unwrap();
        let b = registry.get("b").unwrap();
        let u = a.properties.get("u").unwrap();
        let v = b.properties.get("v").unwrap();
        assert!(Arc::ptr_eq(u, v));
        assert_eq!(u.min_length, Some(2));
    }

    #[test]
    fn test_local_reference() {
        let registry = SchemaRegistry::register(documents(json!({
            "a": {
                "shared": { "type": "integer" },
                "properties": { "n": { "$ref": "#/shared" } }
            }
        })))
        .unwrap();

        let a = registry.get("a").unwrap();
        assert_eq!(a.properties["n"].types, vec![JsonType::Integer]);
    }

    #[test]
    fn test_unresolved_reference_fails_registration() {
        let err = SchemaRegistry::register(documents(json!({
            "a": { "properties": { "u": { "$ref": "definitions#/user/missing" } } }
        })))
        .unwrap_err();

        assert_eq!(err.code(), "DIT_SCHEMA_UNRESOLVED_REF");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_reference_cycle_detected() {
        let err = SchemaRegistry::register(documents(json!({
            "a": { "items": { "$ref": "b" } },
            "b": { "items": { "$ref": "a" } }
        })))
        .unwrap_err();

        assert_eq!(err.code(), "DIT_SCHEMA_REF_CYCLE");
    }

    #[test]
    fn test_invalid_pattern_fails_registration() {
        let err = SchemaRegistry::register(documents(json!({
            "a": { "type": "string", "pattern": "([a-z" }
        })))
        .unwrap_err();

        assert_eq!(err.code(), "DIT_SCHEMA_INVALID_PATTERN");
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = SchemaRegistry::register(documents(json!({
            "a": { "type": "int" }
        })))
        .unwrap_err();

        assert_eq!(err.code(), "DIT_SCHEMA_MALFORMED");
    }

    #[test]
    fn test_builtin_schemas_compile() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(registry.contains("postContacts"));
        assert!(registry.contains("patchDit"));
        assert!(registry.contains("definitions"));
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("one.json"),
            r#"{ "definitions": { "tagname": { "type": "string" } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("two.json"),
            r#"{ "getTag": { "properties": { "t": { "$ref": "definitions#/tagname" } } } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = SchemaRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["definitions", "getTag"]);
    }

    #[test]
    fn test_load_dir_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{ "x": {} }"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{ "x": {} }"#).unwrap();

        let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
        assert_eq!(err.code(), "DIT_SCHEMA_DUPLICATE");
    }
}
