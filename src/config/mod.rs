//! Configuration module for the study journal backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Connection parameters for the remote mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the PostgREST-compatible endpoint
    pub url: String,
    /// API key sent as `apikey` and bearer token
    pub key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite file backing the durable cache
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Remote mirror connection, `None` runs offline
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("STUDY_DB_PATH")
            .unwrap_or_else(|_| "./data/study.sqlite".to_string())
            .into();

        let bind_addr = env::var("STUDY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid STUDY_BIND_ADDR format");

        let log_level = env::var("STUDY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("STUDY_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let timeout_secs = env::var("STUDY_REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);

        let remote = remote_from_parts(
            env::var("STUDY_REMOTE_URL").ok(),
            env::var("STUDY_REMOTE_KEY").ok(),
            Duration::from_secs(timeout_secs),
        );

        Self {
            db_path,
            bind_addr,
            log_level,
            log_json,
            remote,
        }
    }
}

/// Both endpoint and key must be present and non-blank to go online.
fn remote_from_parts(
    url: Option<String>,
    key: Option<String>,
    timeout: Duration,
) -> Option<RemoteConfig> {
    let url = url.map(|u| u.trim().trim_end_matches('/').to_string())?;
    let key = key.map(|k| k.trim().to_string())?;
    if url.is_empty() || key.is_empty() {
        return None;
    }
    Some(RemoteConfig { url, key, timeout })
}
