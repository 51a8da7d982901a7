//! In-process event bus.
//!
//! Delivers each published envelope to the handlers subscribed to its type,
//! in the publishing task, before `publish` returns. Keeps a bounded history
//! of recent envelopes for inspection.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// Number of envelopes retained in the history.
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

/// In-process event bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InProcessEventBus::new());
/// bus.subscribe("verification.failed.v1", Arc::new(LogVerificationFailed));
///
/// bus.publish(notification.to_envelope()).await?;
/// assert!(bus.has_event("verification.failed.v1"));
/// ```
pub struct InProcessEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    history: RwLock<VecDeque<EventEnvelope>>,
    history_limit: usize,
}

impl InProcessEventBus {
    /// Creates a new bus with the default history limit.
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::new()),
            history_limit,
        }
    }

    /// Returns retained envelopes, oldest first.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.history
            .read()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns retained envelopes of a specific type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.history.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.history
            .read()
            .map(|h| h.iter().any(|e| e.event_type == event_type))
            .unwrap_or(false)
    }

    /// Drops the retained history.
    pub fn clear(&self) {
        if let Ok(mut history) = self.history.write() {
            history.clear();
        }
    }

    fn remember(&self, event: &EventEnvelope) -> Result<(), DomainError> {
        if self.history_limit == 0 {
            return Ok(());
        }
        let mut history = self.history.write().map_err(|_| lock_poisoned("history"))?;
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(event.clone());
        Ok(())
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned(which: &str) -> DomainError {
    DomainError::new(
        ErrorCode::EventPublishFailed,
        format!("InProcessEventBus: {} lock poisoned", which),
    )
}

#[async_trait]
impl EventPublisher for InProcessEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.remember(&event)?;

        // Clone handlers to release lock before await points
        let type_handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().map_err(|_| lock_poisoned("handlers"))?;
            handlers
                .get(&event.event_type)
                .cloned()
                .unwrap_or_default()
        };

        // Every handler runs even when an earlier one fails.
        let mut failed: Vec<&'static str> = Vec::new();
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::error!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    error = %e,
                    "event handler failed"
                );
                failed.push(handler.name());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::EventPublishFailed,
                format!("{} handler(s) failed: {}", failed.len(), failed.join(", ")),
            )
            .with_detail("event_type", event.event_type.clone()))
        }
    }
}

impl EventSubscriber for InProcessEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }
}
