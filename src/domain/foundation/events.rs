//! Notification plumbing shared by every record kind.
//!
//! A notification struct implements [`DomainEvent`] (usually through
//! [`domain_event!`](crate::domain_event)) and is wrapped in an
//! [`EventEnvelope`] before it reaches an `EventPublisher`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// A notification about a record that changed.
pub trait DomainEvent: Send + Sync {
    /// Routing key, suffixed with the schema version (`verification.failed.v1`).
    fn event_type(&self) -> &'static str;

    /// Kind of record the event is about.
    fn aggregate_type(&self) -> &'static str;

    /// External id of that record.
    fn aggregate_id(&self) -> String;

    fn occurred_at(&self) -> Timestamp;

    fn event_id(&self) -> EventId;

    /// Version parsed from the `.vN` suffix of [`event_type`](Self::event_type).
    fn schema_version(&self) -> u32 {
        schema_version_of(self.event_type())
    }
}

/// Implements [`DomainEvent`] for a struct with `event_id` and `occurred_at`
/// fields.
///
/// ```ignore
/// domain_event!(VerificationFailed => "verification.failed.v1", "Verification" by verification_id);
/// ```
#[macro_export]
macro_rules! domain_event {
    ($event:ident => $event_type:literal, $aggregate_type:literal by $id_field:ident) => {
        impl $crate::domain::foundation::DomainEvent for $event {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn aggregate_type(&self) -> &'static str {
                $aggregate_type
            }

            fn aggregate_id(&self) -> String {
                self.$id_field.to_string()
            }

            fn occurred_at(&self) -> $crate::domain::foundation::Timestamp {
                self.occurred_at
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.event_id.clone()
            }
        }
    };
}

/// Version suffix of an event type; unversioned types count as 1.
pub fn schema_version_of(event_type: &str) -> u32 {
    match event_type.rsplit_once(".v") {
        Some((_, digits)) => digits.parse().unwrap_or(1),
        None => 1,
    }
}

/// Unique id of one emitted event; consumers deduplicate on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context that travels with an envelope but is not part of the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Ties together every event produced while handling one callback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Host application user owning the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Serialized notification as handed to publishers and subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub event_type: String,
    pub schema_version: u32,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub occurred_at: Timestamp,
    /// The event struct itself, as JSON.
    pub payload: JsonValue,
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Wraps `event`. A payload that fails to serialize becomes `null`.
    pub fn from_event<T>(event: &T) -> Self
    where
        T: DomainEvent + Serialize,
    {
        Self {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            schema_version: event.schema_version(),
            aggregate_id: event.aggregate_id(),
            aggregate_type: event.aggregate_type().to_string(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event).unwrap_or(JsonValue::Null),
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(id.into());
        self
    }

    /// Decodes the payload back into its event struct.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct SampleEvent {
        event_id: EventId,
        record_id: String,
        occurred_at: Timestamp,
    }

    crate::domain_event!(SampleEvent => "sample.happened.v2", "Sample" by record_id);

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn event_id_displays_inner_value() {
        let id = EventId::from_string("evt-42");
        assert_eq!(id.as_str(), "evt-42");
        assert_eq!(id.to_string(), "evt-42");
    }

    #[test]
    fn schema_version_comes_from_suffix() {
        assert_eq!(schema_version_of("verification.completed.v1"), 1);
        assert_eq!(schema_version_of("verification.completed.v12"), 12);
        assert_eq!(schema_version_of("legacy.event"), 1);
        assert_eq!(schema_version_of("broken.vX"), 1);
    }

    #[test]
    fn from_event_copies_identity_fields() {
        let event = SampleEvent {
            event_id: EventId::from_string("evt-1"),
            record_id: "ver_1".to_string(),
            occurred_at: Timestamp::from_unix_secs(1_700_000_000),
        };

        let envelope = EventEnvelope::from_event(&event);

        assert_eq!(envelope.event_id.as_str(), "evt-1");
        assert_eq!(envelope.event_type, "sample.happened.v2");
        assert_eq!(envelope.schema_version, 2);
        assert_eq!(envelope.aggregate_id, "ver_1");
        assert_eq!(envelope.aggregate_type, "Sample");
        assert_eq!(envelope.occurred_at.as_unix_secs(), 1_700_000_000);
    }

    #[test]
    fn payload_decodes_back_with_metadata() {
        let event = SampleEvent {
            event_id: EventId::new(),
            record_id: "auth_9".to_string(),
            occurred_at: Timestamp::now(),
        };

        let envelope = EventEnvelope::from_event(&event)
            .with_correlation_id("corr-1")
            .with_user_id("7");
        let decoded: SampleEvent = envelope.payload_as().unwrap();

        assert_eq!(decoded.record_id, "auth_9");
        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(envelope.metadata.user_id.as_deref(), Some("7"));
    }
}
