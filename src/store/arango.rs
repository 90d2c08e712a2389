//! ArangoDB HTTP cursor client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, trace};

use crate::config::DatabaseConfig;

use super::errors::{StoreError, StoreResult};
use super::statement::{QueryOutcome, Statement};
use super::GraphStore;

/// One batch of a cursor, as returned by both the create and the
/// continuation requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorBatch {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    extra: Option<CursorExtra>,
}

#[derive(Debug, Deserialize)]
struct CursorExtra {
    #[serde(default)]
    stats: Option<CursorStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorStats {
    #[serde(default)]
    writes_executed: u64,
}

impl CursorBatch {
    fn writes_executed(&self) -> u64 {
        self.extra
            .as_ref()
            .and_then(|extra| extra.stats.as_ref())
            .map_or(0, |stats| stats.writes_executed)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineError {
    #[serde(default)]
    error_num: i64,
    #[serde(default)]
    error_message: String,
}

/// `GraphStore` backed by an ArangoDB server
#[derive(Debug, Clone)]
pub struct ArangoStore {
    client: Client,
    cursor_url: String,
    username: String,
    password: String,
    batch_size: u32,
}

impl ArangoStore {
    pub fn new(config: &DatabaseConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cursor_url: format!(
                "{}/_db/{}/_api/cursor",
                config.url.trim_end_matches('/'),
                config.name
            ),
            username: config.username.clone(),
            password: config.password.clone(),
            batch_size: config.batch_size,
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<CursorBatch> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            let engine: EngineError = serde_json::from_value(body).unwrap_or(EngineError {
                error_num: 0,
                error_message: status.to_string(),
            });
            return Err(StoreError::Engine {
                status: status.as_u16(),
                num: engine.error_num,
                message: engine.error_message,
            });
        }

        serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn run(&self, statement: &Statement) -> StoreResult<QueryOutcome> {
        let create = self.request(Method::POST, &self.cursor_url).json(&json!({
            "query": statement.query,
            "bindVars": statement.bind_vars,
            "batchSize": self.batch_size,
        }));

        let mut batch = self.send(create).await?;
        let mut outcome = QueryOutcome::default();

        loop {
            outcome.writes_executed += batch.writes_executed();
            outcome.rows.append(&mut batch.result);

            if !batch.has_more {
                break;
            }
            let id = batch
                .id
                .take()
                .ok_or_else(|| StoreError::Decode("cursor has more rows but no id".to_string()))?;
            let next = self.request(Method::PUT, &format!("{}/{}", self.cursor_url, id));
            batch = self.send(next).await?;
        }

        Ok(outcome)
    }
}

#[async_trait]
impl GraphStore for ArangoStore {
    async fn execute(&self, statement: &Statement) -> StoreResult<QueryOutcome> {
        match self.run(statement).await {
            Ok(outcome) => {
                trace!(
                    statement = statement.name,
                    rows = outcome.rows.len(),
                    writes = outcome.writes_executed,
                    "statement executed"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(statement = statement.name, code = err.code(), "statement failed: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_url() {
        let config = DatabaseConfig {
            url: "http://db:8529/".to_string(),
            name: "ditup".to_string(),
            ..Default::default()
        };
        let store = ArangoStore::new(&config).unwrap();
        assert_eq!(store.cursor_url, "http://db:8529/_db/ditup/_api/cursor");
    }

    #[test]
    fn test_batch_decoding() {
        let batch: CursorBatch = serde_json::from_value(serde_json::json!({
            "result": [{ "a": 1 }],
            "hasMore": true,
            "id": "42",
            "extra": { "stats": { "writesExecuted": 1, "writesIgnored": 0 } },
            "error": false,
            "code": 201
        }))
        .unwrap();

        assert!(batch.has_more);
        assert_eq!(batch.id.as_deref(), Some("42"));
        assert_eq!(batch.writes_executed(), 1);
    }

    #[test]
    fn test_batch_without_stats() {
        let batch: CursorBatch = serde_json::from_value(serde_json::json!({ "result": [] })).unwrap();
        assert_eq!(batch.writes_executed(), 0);
        assert!(!batch.has_more);
    }

    #[test]
    fn test_engine_error_decoding() {
        let engine: EngineError = serde_json::from_value(serde_json::json!({
            "error": true,
            "code": 400,
            "errorNum": 1501,
            "errorMessage": "syntax error"
        }))
        .unwrap();
        assert_eq!(engine.error_num, 1501);
        assert_eq!(engine.error_message, "syntax error");
    }
}
