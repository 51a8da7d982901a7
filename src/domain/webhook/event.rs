//! Typed provider webhook events.
//!
//! The body is parsed once, after the signature has been accepted. Event kinds
//! form a closed set; anything else becomes [`WebhookEvent::Unknown`] and is
//! acknowledged without side effects.

use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{Score, ValidationError};
use crate::domain::verification::VerificationResult;

/// Event type strings sent by the provider.
pub mod event_types {
    pub const VERIFICATION_COMPLETED: &str = "verification.completed";
    pub const VERIFICATION_FAILED: &str = "verification.failed";
    pub const AUTHENTICATION_COMPLETED: &str = "authentication.completed";
    pub const AUTHENTICATION_FAILED: &str = "authentication.failed";
}

/// Payload of `verification.completed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationCompletedPayload {
    pub verification_id: Option<String>,
    pub result: Option<VerificationResult>,
    pub confidence_score: Option<Score>,
}

/// Payload of `verification.failed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationFailedPayload {
    pub verification_id: Option<String>,
    /// Kept as sent; the provider uses both strings and objects here.
    pub reason: Option<JsonValue>,
}

/// Payload of `authentication.completed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthenticationCompletedPayload {
    pub authentication_id: Option<String>,
    pub verification_id: Option<String>,
    pub result: Option<VerificationResult>,
    pub confidence_score: Option<Score>,
    pub liveness_score: Option<Score>,
    pub face_match_score: Option<Score>,
}

/// Payload of `authentication.failed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthenticationFailedPayload {
    pub authentication_id: Option<String>,
    pub reason: Option<JsonValue>,
}

/// A verified provider callback.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    VerificationCompleted(VerificationCompletedPayload),
    VerificationFailed(VerificationFailedPayload),
    AuthenticationCompleted(AuthenticationCompletedPayload),
    AuthenticationFailed(AuthenticationFailedPayload),
    /// Unrecognized or absent `type`.
    Unknown { event_type: Option<String> },
}

impl WebhookEvent {
    /// Builds an event from a decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when a known field holds a value outside its
    /// domain (unknown result, score outside 0-100, id of the wrong JSON type).
    /// Absent or `null` fields are never errors.
    pub fn from_json(body: &JsonValue) -> Result<Self, ValidationError> {
        let Some(fields) = body.as_object() else {
            return Ok(WebhookEvent::Unknown { event_type: None });
        };

        let event_type = match fields.get("type").and_then(JsonValue::as_str) {
            Some(t) => t,
            None => return Ok(WebhookEvent::Unknown { event_type: None }),
        };

        let event = match event_type {
            event_types::VERIFICATION_COMPLETED => {
                WebhookEvent::VerificationCompleted(VerificationCompletedPayload {
                    verification_id: id_field(fields, "verification_id")?,
                    result: result_field(fields)?,
                    confidence_score: score_field(fields, "confidence_score")?,
                })
            }
            event_types::VERIFICATION_FAILED => {
                WebhookEvent::VerificationFailed(VerificationFailedPayload {
                    verification_id: id_field(fields, "verification_id")?,
                    reason: reason_field(fields),
                })
            }
            event_types::AUTHENTICATION_COMPLETED => {
                WebhookEvent::AuthenticationCompleted(AuthenticationCompletedPayload {
                    authentication_id: id_field(fields, "authentication_id")?,
                    verification_id: id_field(fields, "verification_id")?,
                    result: result_field(fields)?,
                    confidence_score: score_field(fields, "confidence_score")?,
                    liveness_score: score_field(fields, "liveness_score")?,
                    face_match_score: score_field(fields, "face_match_score")?,
                })
            }
            event_types::AUTHENTICATION_FAILED => {
                WebhookEvent::AuthenticationFailed(AuthenticationFailedPayload {
                    authentication_id: id_field(fields, "authentication_id")?,
                    reason: reason_field(fields),
                })
            }
            other => WebhookEvent::Unknown {
                event_type: Some(other.to_string()),
            },
        };

        Ok(event)
    }

    /// The `type` string this event was parsed from, if any.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            WebhookEvent::VerificationCompleted(_) => Some(event_types::VERIFICATION_COMPLETED),
            WebhookEvent::VerificationFailed(_) => Some(event_types::VERIFICATION_FAILED),
            WebhookEvent::AuthenticationCompleted(_) => {
                Some(event_types::AUTHENTICATION_COMPLETED)
            }
            WebhookEvent::AuthenticationFailed(_) => Some(event_types::AUTHENTICATION_FAILED),
            WebhookEvent::Unknown { event_type } => event_type.as_deref(),
        }
    }
}

/// The verification a `verification.*` body refers to, read leniently.
///
/// Used to attach an audit attempt to callbacks that fail to parse or apply,
/// so it never errors: a malformed id yields `None`.
pub fn audited_verification_id(body: &JsonValue) -> Option<String> {
    let fields = body.as_object()?;
    match fields.get("type").and_then(JsonValue::as_str)? {
        event_types::VERIFICATION_COMPLETED | event_types::VERIFICATION_FAILED => {
            id_field(fields, "verification_id").ok().flatten()
        }
        _ => None,
    }
}

/// Ids arrive as strings or bare numbers. Empty strings count as absent.
fn id_field(fields: &Map<String, JsonValue>, name: &str) -> Result<Option<String>, ValidationError> {
    match fields.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.is_empty() => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ValidationError::invalid_value(
            name,
            format!("expected string id, got {}", json_kind(other)),
        )),
    }
}

fn result_field(fields: &Map<String, JsonValue>) -> Result<Option<VerificationResult>, ValidationError> {
    match fields.get("result") {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => s.parse().map(Some),
        Some(other) => Err(ValidationError::invalid_value(
            "result",
            format!("expected string, got {}", json_kind(other)),
        )),
    }
}

/// Scores are numbers, or numeric strings from older provider versions.
fn score_field(fields: &Map<String, JsonValue>, name: &str) -> Result<Option<Score>, ValidationError> {
    let value = match fields.get(name) {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) => Score::try_new(name, v).map(Some),
        None => Err(ValidationError::invalid_value(name, "expected a number")),
    }
}

fn reason_field(fields: &Map<String, JsonValue>) -> Option<JsonValue> {
    fields.get("reason").filter(|v| !v.is_null()).cloned()
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
