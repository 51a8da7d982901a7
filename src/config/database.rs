//! PostgreSQL record store settings
//!
//! The whole section is optional: without it the gateway keeps records in
//! memory.

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` connection URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply `migrations/` before serving
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: false,
        }
    }

    /// Pool options derived from this configuration
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(self.idle_timeout_secs)))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_URL"));
        }
        let is_postgres = ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !is_postgres {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        Ok(())
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "postgresql://gateway:pw@localhost:5432/verifinow";

    #[test]
    fn new_uses_defaults() {
        let config = DatabaseConfig::new(URL);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pool_options_follow_config() {
        let config = DatabaseConfig {
            max_connections: 7,
            ..DatabaseConfig::new(URL)
        };
        let options = config.pool_options();
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn blank_url_is_missing() {
        assert!(matches!(
            DatabaseConfig::new("  ").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn non_postgres_url_is_rejected() {
        assert!(matches!(
            DatabaseConfig::new("mysql://localhost/verifinow").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let inverted = DatabaseConfig {
            min_connections: 10,
            max_connections: 5,
            ..DatabaseConfig::new(URL)
        };
        assert!(matches!(
            inverted.validate(),
            Err(ValidationError::InvalidPoolSize)
        ));

        let oversized = DatabaseConfig {
            max_connections: 150,
            ..DatabaseConfig::new(URL)
        };
        assert!(matches!(
            oversized.validate(),
            Err(ValidationError::PoolSizeTooLarge)
        ));
    }
}
