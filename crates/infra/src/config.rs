//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `invoicefy.toml` in the working directory (or the file named by
//!    `INVOICEFY_CONFIG`), optional
//! 3. `INVOICEFY__`-prefixed environment variables, `__` between sections
//!    (`INVOICEFY__SERVER__PORT=9000`, `INVOICEFY__STORE__BACKEND=postgres`)

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use invoicefy_observability::LogSettings;

pub const DEFAULT_CONFIG_FILE: &str = "invoicefy.toml";

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub cors: CorsConfig,
    pub log: LogSettings,
    /// Directory with the front-end; served as the router fallback.
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Empty means "not configured".
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 24 * 60,
            bcrypt_cost: invoicefy_auth::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load from the default file location and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("INVOICEFY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config = Config::builder()
            .add_source(File::with_name(&path).format(FileFormat::Toml).required(false))
            .add_source(env_source())
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;
        app.resolve_jwt_secret(std::env::var("JWT_SECRET").ok());
        app.validate()?;
        Ok(app)
    }

    /// Parse a TOML document on top of the defaults. Environment is ignored.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let app: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// `auth.jwt_secret`, then `JWT_SECRET`, then the insecure dev default.
    fn resolve_jwt_secret(&mut self, fallback: Option<String>) {
        if !self.auth.jwt_secret.is_empty() {
            return;
        }
        self.auth.jwt_secret = fallback
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());
    }

    /// Whether tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            return Err(ConfigError::Message(
                "store.database_url is required for the postgres backend".to_string(),
            ));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigError::Message("auth.token_ttl_minutes must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("INVOICEFY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}
