//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the `config`
//! and `dotenvy` crates. Variables use the `VERIFINOW` prefix and `__` between
//! nested keys.
//!
//! # Example
//!
//! ```no_run
//! use verifinow_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod server;
mod webhook;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL record store; records are kept in memory when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// VerifyNow webhook receiver
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `VERIFINOW__*` variables:
    ///
    /// - `VERIFINOW__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `VERIFINOW__DATABASE__URL=...` -> `database.url = ...`
    /// - `VERIFINOW__WEBHOOK__SECRET=...` -> `webhook.secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VERIFINOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.webhook.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
