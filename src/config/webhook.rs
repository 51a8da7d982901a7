//! VerifyNow webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::webhook::{WebhookSignatureVerifier, DEFAULT_REPLAY_WINDOW_SECS};

/// Upper bound on the replay window; anything wider defeats the check.
const MAX_REPLAY_WINDOW_SECS: u64 = 3600;

/// Webhook receiver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret issued by VerifyNow
    pub secret: SecretString,

    /// Accepted clock skew between `X-Webhook-Timestamp` and now, in seconds
    #[serde(default = "default_replay_window")]
    pub replay_window_secs: u64,

    /// Mount `POST /api/webhooks/verifinow`
    #[serde(default = "default_register_routes")]
    pub register_routes: bool,
}

impl WebhookConfig {
    /// Build the verifier this configuration describes.
    pub fn verifier(&self) -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(self.secret.clone(), self.replay_window_secs)
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK_SECRET"));
        }
        if self.replay_window_secs == 0 || self.replay_window_secs > MAX_REPLAY_WINDOW_SECS {
            return Err(ValidationError::InvalidReplayWindow);
        }
        Ok(())
    }
}

fn default_replay_window() -> u64 {
    DEFAULT_REPLAY_WINDOW_SECS
}

fn default_register_routes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, window: u64) -> WebhookConfig {
        WebhookConfig {
            secret: SecretString::new(secret.to_string()),
            replay_window_secs: window,
            register_routes: true,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config("vn_whsec", 300).validate().is_ok());
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        assert!(matches!(
            config("  ", 300).validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_replay_window_bounds() {
        assert!(config("vn_whsec", 0).validate().is_err());
        assert!(config("vn_whsec", 3601).validate().is_err());
        assert!(config("vn_whsec", 3600).validate().is_ok());
    }

    #[test]
    fn test_verifier_uses_configured_window() {
        assert_eq!(config("vn_whsec", 120).verifier().replay_window_secs(), 120);
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let rendered = format!("{:?}", config("vn_super_secret", 300));
        assert!(!rendered.contains("vn_super_secret"));
    }
}
