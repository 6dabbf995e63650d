//! # ri-config
//!
//! Layered settings for Rusty-Inbox: built-in defaults, then an optional
//! `rusty-inbox.toml`, then `RUSTY_INBOX__SECTION__KEY` environment variables.

use std::time::Duration;

use ri_core::validation::MIN_SIGNING_KEY_LEN;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Default operator session lifetime: 8 hours.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub limits: LimitSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 0 keeps the actix default of one worker per core
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// Argon2 PHC hash of the operator secret
    pub operator_secret_hash: SecretString,
    /// HS256 key for session tokens
    pub session_signing_key: SecretString,
    pub session_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    pub store_timeout_ms: u64,
    pub auth_timeout_ms: u64,
    pub feed_default_limit: u32,
    pub feed_max_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, then `rusty-inbox.toml` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Self::defaults()?
                .add_source(config::File::with_name("rusty-inbox").required(false))
                .add_source(
                    config::Environment::with_prefix("RUSTY_INBOX")
                        .prefix_separator("__")
                        .separator("__"),
                ),
        )
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 0)?
            .set_default("database.url", "sqlite:rusty_inbox.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.session_ttl_secs", DEFAULT_SESSION_TTL_SECS)?
            .set_default("auth.issuer", "rusty-inbox")?
            .set_default("limits.store_timeout_ms", 5000)?
            .set_default("limits.auth_timeout_ms", 5000)?
            .set_default("limits.feed_default_limit", 10)?
            .set_default("limits.feed_max_limit", 50)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.operator_secret_hash.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.operator_secret_hash is empty".into()));
        }
        if self.auth.session_signing_key.expose_secret().len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.session_signing_key must be at least {MIN_SIGNING_KEY_LEN} bytes"
            )));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_secs must be positive".into()));
        }
        if self.limits.store_timeout_ms == 0 || self.limits.auth_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }
        if self.limits.feed_max_limit == 0 || self.limits.feed_default_limit > self.limits.feed_max_limit {
            return Err(ConfigError::Invalid(
                "limits.feed_default_limit must be between 1 and limits.feed_max_limit".into(),
            ));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl LimitSettings {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}
