//! Ports - Contracts the domain needs from the outside world.
//!
//! - `VerificationStore` - verification, authentication and attempt records
//! - `EventPublisher` - hands notifications to the host application
//! - `EventSubscriber` / `EventHandler` - reacts to published notifications

mod event_publisher;
mod event_subscriber;
mod verification_store;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventHandler, EventSubscriber};
pub use verification_store::VerificationStore;
