use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, ServerConfig};
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            database: default_database(),
        }
    }
}

/// The single operator credential and token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    /// Argon2 PHC string, e.g. the output of `portal-service hash-password`.
    pub password_hash: Secret<String>,
    pub jwt_secret: Secret<String>,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "decor_portal".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    720
}

fn default_login_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PortalConfig {
    pub fn load() -> Result<Self, AppError> {
        core_config::load()
    }
}
