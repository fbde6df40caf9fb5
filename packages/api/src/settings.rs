//! # Runtime settings
//!
//! Layered with the `config` crate, lowest priority first:
//!
//! 1. built-in defaults (below),
//! 2. an optional `photobook.toml` in the working directory,
//! 3. environment variables `PHOTOBOOK__<SECTION>__<KEY>` (a `.env` file is
//!    loaded first through `dotenvy`).
//!
//! ```toml
//! [database]
//! url = "sqlite://photobook.db"
//! max_connections = 5
//! query_timeout_secs = 5
//!
//! [server]
//! address = "127.0.0.1:8080"
//! request_timeout_secs = 30
//!
//! [session]
//! ttl_secs = 120
//! secure_cookie = false
//!
//! [auth]
//! # pepper = "server-side secret mixed into every password hash"
//!
//! [bootstrap]
//! # admin_username = "admin"
//! # admin_password = "change-me"
//! admin_name = "Administrator"
//! ```

use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub query_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            query_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub address: String,
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub ttl_secs: u32,
    pub secure_cookie: bool,
}

#[derive(Clone, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub pepper: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Administrator created at startup when it does not exist yet.
#[derive(Clone, Deserialize)]
pub struct BootstrapSettings {
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    pub admin_name: String,
}

impl std::fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("admin_username", &self.admin_username)
            .field("admin_name", &self.admin_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub session: SessionSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub bootstrap: BootstrapSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Self::defaults()?
                .add_source(
                    File::with_name("photobook")
                        .format(FileFormat::Toml)
                        .required(false),
                )
                .add_source(Environment::with_prefix("PHOTOBOOK").separator("__")),
        )
    }

    /// Defaults overlaid with a TOML document instead of the file system and
    /// environment.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite://photobook.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.query_timeout_secs", 5)?
            .set_default("server.address", "127.0.0.1:8080")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("session.ttl_secs", 120)?
            .set_default("session.secure_cookie", false)?
            .set_default("bootstrap.admin_name", "Administrator")
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
