//! # configs
//!
//! Layered runtime settings: `config/default.toml` (optional, checked in with
//! non-secret defaults) overridden by `EDUBRIDGE__`-prefixed environment
//! variables, e.g. `EDUBRIDGE__SERVER__PORT=8080` or
//! `EDUBRIDGE__AUTH__JWT_SECRET=...`. A `.env` file is honored in development.

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    #[default]
    Development,
    Production,
}

impl RuntimeEnv {
    /// Production hides error detail and switches logs to JSON.
    pub fn is_production(self) -> bool {
        self == RuntimeEnv::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5000,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC signing secret; no default on purpose
    pub jwt_secret: SecretString,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl_hours() -> i64 {
    // 30 days
    720
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON snapshot the document store loads at boot and saves on shutdown
    pub snapshot_path: String,
    /// Root directory for uploaded files
    pub media_dir: String,
    /// Public URL prefix uploads are served under
    pub media_url_prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_path: "./data/edubridge.json".to_owned(),
            media_dir: "./data/media".to_owned(),
            media_url_prefix: "/media".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub base_url: String,
    /// Missing key keeps the server up; completion calls fail upstream
    pub api_key: Option<SecretString>,
    pub coder_model: String,
    pub reasoning_model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_owned(),
            api_key: None,
            coder_model: "kwaipilot/kat-coder-pro:free".to_owned(),
            reasoning_model: "x-ai/grok-4.1-fast:free".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnv,
    #[serde(default)]
    pub server: ServerSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub ai: AiSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("EDUBRIDGE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
