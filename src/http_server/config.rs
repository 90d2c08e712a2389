//! The `http` section of `ditapi.json`
//!
//! ```json
//! { "http": { "host": "0.0.0.0", "port": 3000, "cors_origins": ["http://localhost:4200"] } }
//! ```
//!
//! `DITAPI_PORT` overrides `port` (see [`crate::config`]).

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Listener, browser access and request size limits of the REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins of the web client allowed to call the API; empty allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// The web client's dev server
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}

fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl HttpServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }

    /// Configured origins as header values; malformed entries are skipped
    pub fn origin_headers(&self) -> Vec<HeaderValue> {
        self.cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring malformed CORS origin");
                    None
                }
            })
            .collect()
    }
}
