use std::net::SocketAddr;
use std::path::PathBuf;

use crate::regions::CountryCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Postgres backing store. `None` when offers are read over PostgREST instead.
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of a PostgREST endpoint exposing the `offers` table.
    pub rest_url: Option<String>,
    pub rest_api_key: Option<String>,
    pub geo_probe_url: String,
    /// Country assumed when the geolocation probe fails.
    pub geo_fallback_country: CountryCode,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Directory backing the client-side key/value storage (favorites, consent).
    pub storage_dir: PathBuf,
    pub presentations_path: PathBuf,
    pub revalidate_tokens: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("rest_url", &self.rest_url)
            .field(
                "rest_api_key",
                &self.rest_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geo_probe_url", &self.geo_probe_url)
            .field("geo_fallback_country", &self.geo_fallback_country)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("storage_dir", &self.storage_dir)
            .field("presentations_path", &self.presentations_path)
            .field(
                "revalidate_tokens",
                &format!("[{} redacted]", self.revalidate_tokens.len()),
            )
            .finish()
    }
}
