//! Configuration errors

use thiserror::Error;

/// `AppConfig::load` failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration rejected: {0}")]
    Invalid(#[from] ValidationError),
}

/// `AppConfig::validate` failure; names the offending setting
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequired(&'static str),

    #[error("server.host/server.port do not form a socket address: {0}")]
    InvalidAddress(String),

    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("server.request_timeout_secs must be between 1 and 300")]
    InvalidTimeout,

    #[error("database.url must use the postgres:// or postgresql:// scheme")]
    InvalidDatabaseUrl,

    #[error("database.min_connections exceeds database.max_connections")]
    InvalidPoolSize,

    #[error("database.max_connections exceeds 100")]
    PoolSizeTooLarge,

    #[error("webhook.replay_window_secs must be between 1 and 3600")]
    InvalidReplayWindow,
}
