//! Application configuration
//!
//! Loaded from an optional JSON file; every field has a default. A handful
//! of environment variables override the file so secrets can stay out of it:
//! `DITAPI_PORT`, `DITAPI_DB_URL`, `DITAPI_DB_PASSWORD`, `DITAPI_JWT_SECRET`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::observability::LogConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "DIT_CONFIG_READ",
            ConfigError::Parse { .. } => "DIT_CONFIG_INVALID",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Something wrong with the configuration that does not stop boot. Loading
/// happens before the subscriber exists, so these are handed back to the
/// caller to log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("config file {0} not found, using defaults")]
    FileNotFound(PathBuf),

    #[error("invalid DITAPI_PORT value '{value}': {reason}")]
    InvalidPort { value: String, reason: String },
}

impl ConfigWarning {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigWarning::FileNotFound(_) => "DIT_CONFIG_DEFAULTS",
            ConfigWarning::InvalidPort { .. } => "DIT_CONFIG_BAD_OVERRIDE",
        }
    }
}

/// Graph database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base URL of the engine (default: "http://127.0.0.1:8529")
    #[serde(default = "default_db_url")]
    pub url: String,

    /// Database name (default: "ditup")
    #[serde(default = "default_db_name")]
    pub name: String,

    #[serde(default = "default_db_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Rows fetched per cursor round trip
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_url() -> String {
    "http://127.0.0.1:8529".to_string()
}

fn default_db_name() -> String {
    "ditup".to_string()
}

fn default_db_username() -> String {
    "root".to_string()
}

fn default_batch_size() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            name: default_db_name(),
            username: default_db_username(),
            password: String::new(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Token issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// Token lifetime (default: 3 hours)
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_ttl_minutes() -> i64 {
    180
}

fn default_issuer() -> String {
    "ditapi".to_string()
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            ttl_minutes: default_ttl_minutes(),
            issuer: default_issuer(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub log: LogConfig,

    /// Load schema documents from this directory instead of the built-in set
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Reads the file (when given) and applies environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<(Self, Vec<ConfigWarning>)> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let warnings = config.apply_overrides(|key| std::env::var(key).ok());
        Ok((config, warnings))
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Applies `DITAPI_*` overrides; a malformed port is ignored and reported
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if let Some(port) = lookup("DITAPI_PORT") {
            match port.parse() {
                Ok(port) => self.http.port = port,
                Err(e) => warnings.push(ConfigWarning::InvalidPort {
                    value: port,
                    reason: e.to_string(),
                }),
            }
        }
        if let Some(url) = lookup("DITAPI_DB_URL") {
            self.database.url = url;
        }
        if let Some(password) = lookup("DITAPI_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(secret) = lookup("DITAPI_JWT_SECRET") {
            self.jwt.secret = secret;
        }
        warnings
    }
}
