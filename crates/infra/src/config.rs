//! Configuration loading and representation.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional `medstock.toml` (or the file named by `MEDSTOCK_CONFIG`)
//! 3. environment variables prefixed `MEDSTOCK`, nested with `__`
//!    (e.g. `MEDSTOCK__DATABASE__URL`, `MEDSTOCK__AUTH__JWT_SECRET`)

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "medstock";
const DEV_JWT_SECRET: &str = "medstock-development-secret-change-me-before-going-anywhere-near-prod";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
    pub stock: StockSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. Absent means the in-memory store.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// Created on startup when no operator exists yet.
    pub bootstrap_admin_login: String,
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bootstrap_admin_login", &self.bootstrap_admin_login)
            .field(
                "bootstrap_admin_password",
                &self.bootstrap_admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

/// Thresholds for the derived stock predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StockSettings {
    pub expiring_soon_days: i64,
    pub near_minimum_margin_percent: i64,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            expiring_soon_days: 45,
            near_minimum_margin_percent: 50,
        }
    }
}

impl AppConfig {
    /// Load from `MEDSTOCK_CONFIG` (or `medstock.toml`) and the environment.
    pub fn load() -> Result<Self, ConfigLoadError> {
        let file = std::env::var("MEDSTOCK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigLoadError> {
        let defaults = StockSettings::default();
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.token_ttl_minutes", 8 * 60)?
            .set_default("auth.bootstrap_admin_login", "admin")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .set_default("stock.expiring_soon_days", defaults.expiring_soon_days)?
            .set_default(
                "stock.near_minimum_margin_percent",
                defaults.near_minimum_margin_percent,
            )?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("MEDSTOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigLoadError::Invalid(
                "auth.jwt_secret must have at least 32 characters".to_string(),
            ));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigLoadError::Invalid(
                "auth.token_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigLoadError::Invalid(
                "database.max_connections must be positive".to_string(),
            ));
        }
        if self.stock.expiring_soon_days < 0 || self.stock.near_minimum_margin_percent < 0 {
            return Err(ConfigLoadError::Invalid(
                "stock thresholds cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the built-in development secret is still in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_file() {
        let cfg = AppConfig::load_from("does-not-exist/medstock-test").unwrap();
        assert_eq!(cfg.stock, StockSettings::default());
        assert_eq!(cfg.auth.bootstrap_admin_login, "admin");
        assert!(cfg.database.max_connections > 0);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = AppConfig::load_from("does-not-exist/medstock-test").unwrap();
        let shown = format!("{:?}", cfg.auth);
        assert!(!shown.contains(&cfg.auth.jwt_secret));
    }
}
