//! Configuration for the admin console.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Identity provider settings for the password grant.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub token_url: String,
    #[serde(default)]
    pub client_id: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

// Default values
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (ROSTER_ADMIN__SECTION__KEY format)
    /// 2. admin-console.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.base_url", default_base_url())?
            .set_default("logging.level", default_level())?
            .add_source(File::with_name("admin-console").required(false))
            .add_source(
                Environment::with_prefix("ROSTER_ADMIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
