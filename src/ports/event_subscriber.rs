//! EventSubscriber port - Interface for reacting to published notifications.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Reacts to one published notification.
///
/// Delivery is at-least-once, so handlers must tolerate duplicates. A failing
/// handler does not stop the others from running.
///
/// ```ignore
/// #[async_trait]
/// impl EventHandler for GrantAccess {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let completed: VerificationCompleted = event.payload_as()?;
///         // ...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "GrantAccess"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Appears in logs and publish errors.
    fn name(&self) -> &'static str;
}

/// Registers handlers against event types such as `verification.failed.v1`.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn EventHandler) {}

    #[allow(dead_code)]
    fn assert_subscriber_object_safe(_: &dyn EventSubscriber) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    #[test]
    fn trait_objects_are_send_sync() {
        assert_send_sync::<dyn EventHandler>();
        assert_send_sync::<dyn EventSubscriber>();
    }
}
