//! Configuration management for keyledger
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `KEYLEDGER_*` environment variables (a `.env` file is loaded first if present).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_FILE_NAME: &str = "keys_db.json";

/// What the issuer does when the existing record set cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadFailurePolicy {
    /// Abort the issuance and report the store as unavailable
    #[default]
    Fail,
    /// Continue with an empty record set (overwrites the remote document on save)
    StartEmpty,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Remote document store configuration
#[derive(Clone)]
pub struct StoreConfig {
    pub api_url: String,
    pub document_id: String,
    pub file_name: String,
    pub token: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl StoreConfig {
    /// Whole-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// The bearer token must never end up in logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_url", &self.api_url)
            .field("document_id", &self.document_id)
            .field("file_name", &self.file_name)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Issuance behaviour
#[derive(Debug, Clone, Default)]
pub struct IssuerConfig {
    pub on_load_failure: LoadFailurePolicy,
    pub verify_after_save: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub issuer: IssuerConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Flat view of every setting, as it appears in files and the environment
#[derive(Debug, Deserialize)]
struct RawSettings {
    store_token: Option<String>,
    store_document_id: Option<String>,
    store_file_name: String,
    store_api_url: String,
    store_timeout_secs: u64,
    store_connect_timeout_secs: u64,
    on_load_failure: LoadFailurePolicy,
    verify_after_save: bool,
    log_level: String,
    log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load configuration, layering an optional config file under the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder()
            .set_default("store_file_name", DEFAULT_FILE_NAME)?
            .set_default("store_api_url", DEFAULT_API_URL)?
            .set_default("store_timeout_secs", 15_i64)?
            .set_default("store_connect_timeout_secs", 5_i64)?
            .set_default("on_load_failure", "fail")?
            .set_default("verify_after_save", false)?
            .set_default("log_level", "warn")?
            .set_default("log_format", "console")?;

        // Names used by the earlier tooling, lowest precedence
        if let Ok(token) = env::var("GITHUB_TOKEN") {
            builder = builder.set_default("store_token", token)?;
        }
        if let Ok(gist_id) = env::var("GIST_ID") {
            builder = builder.set_default("store_document_id", gist_id)?;
        }

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let raw: RawSettings = builder
            .add_source(
                // Values stay strings so ids that look numeric survive intact
                Environment::with_prefix("KEYLEDGER").ignore_empty(true),
            )
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let token = required(raw.store_token, "KEYLEDGER_STORE_TOKEN")?;
        let document_id = required(raw.store_document_id, "KEYLEDGER_STORE_DOCUMENT_ID")?;

        if raw.store_file_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "KEYLEDGER_STORE_FILE_NAME must not be empty".to_string(),
            ));
        }
        if raw.store_timeout_secs == 0 || raw.store_connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "store timeouts must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            store: StoreConfig {
                api_url: raw.store_api_url.trim_end_matches('/').to_string(),
                document_id,
                file_name: raw.store_file_name,
                token,
                timeout_secs: raw.store_timeout_secs,
                connect_timeout_secs: raw.store_connect_timeout_secs,
            },
            issuer: IssuerConfig {
                on_load_failure: raw.on_load_failure,
                verify_after_save: raw.verify_after_save,
            },
            log_level: raw.log_level,
            log_format: raw.log_format,
        })
    }

    /// Get log level, defaulting to "warn"
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "warn"
        } else {
            &self.log_level
        }
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Message(format!("{} is not set", name))),
    }
}
