//! EventPublisher port - Interface for handing notifications to the host
//! application without knowing the transport.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing notifications.
///
/// Delivery is at-least-once: a provider retry after a failed publish can hand
/// the same record state to handlers twice.
///
/// # Example
///
/// ```ignore
/// if let Some(notification) = outcome.notification() {
///     publisher.publish(notification.to_envelope()).await?;
/// }
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    #[test]
    fn event_publisher_trait_object_is_send_sync() {
        assert_send_sync::<dyn EventPublisher>();
    }
}
