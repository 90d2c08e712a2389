//! Parameterized statements and their outcomes

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};

/// A named AQL template plus its bind parameters.
///
/// Statements are built fresh for every call and never shared. The name
/// identifies the operation in logs and lets test doubles recognise it.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub name: &'static str,
    pub query: String,
    pub bind_vars: Map<String, Value>,
}

impl Statement {
    pub fn new(name: &'static str, query: impl Into<String>) -> Self {
        Self {
            name,
            query: query.into(),
            bind_vars: Map::new(),
        }
    }

    /// Binds `@key` (or `@@key` for collection parameters)
    pub fn bind(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.bind_vars.insert(key.to_string(), value.into());
        self
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.bind_vars.get(key)
    }

    /// String bind parameter, for test doubles and logging
    pub fn var_str(&self, key: &str) -> Option<&str> {
        self.var(key).and_then(Value::as_str)
    }
}

/// Rows produced by a statement plus the number of documents it wrote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub rows: Vec<Value>,
    pub writes_executed: u64,
}

impl QueryOutcome {
    pub fn new(rows: Vec<Value>, writes_executed: u64) -> Self {
        Self { rows, writes_executed }
    }

    /// Outcome of a read
    pub fn rows(rows: Vec<Value>) -> Self {
        Self::new(rows, 0)
    }

    pub fn first(&self) -> Option<&Value> {
        self.rows.first()
    }

    /// Decodes every row
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<Vec<T>> {
        self.rows.iter().map(decode_row).collect()
    }

    /// Decodes the first row; `None` when the statement returned nothing
    /// or a `null` row
    pub fn decode_first<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        match self.rows.first() {
            None | Some(Value::Null) => Ok(None),
            Some(row) => decode_row(row).map(Some),
        }
    }
}

fn decode_row<T: DeserializeOwned>(row: &Value) -> StoreResult<T> {
    T::deserialize(row).map_err(|e| StoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        name: String,
    }

    #[test]
    fn test_bind_vars() {
        let statement = Statement::new("user.read", "RETURN DOCUMENT('users', @username)")
            .bind("username", "alice");
        assert_eq!(statement.var_str("username"), Some("alice"));
        assert_eq!(statement.var("nope"), None);
    }

    #[test]
    fn test_decode_first() {
        let outcome = QueryOutcome::rows(vec![json!({ "name": "a" })]);
        assert_eq!(outcome.decode_first::<Row>().unwrap(), Some(Row { name: "a".into() }));

        let empty = QueryOutcome::rows(vec![json!(null)]);
        assert_eq!(empty.decode_first::<Row>().unwrap(), None);
    }

    #[test]
    fn test_decode_mismatch_is_error() {
        let outcome = QueryOutcome::rows(vec![json!({ "other": 1 })]);
        assert!(matches!(outcome.decode::<Row>(), Err(StoreError::Decode(_))));
    }
}
