//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - In-process event bus and logging listeners
//! - `http` - Axum routes for provider callbacks
//! - `postgres` - PostgreSQL record store
//! - `storage` - In-memory record store

pub mod events;
pub mod http;
pub mod postgres;
pub mod storage;

pub use events::InProcessEventBus;
pub use self::http::{webhook_router, WebhookAppState};
pub use postgres::PostgresVerificationStore;
pub use storage::InMemoryVerificationStore;
