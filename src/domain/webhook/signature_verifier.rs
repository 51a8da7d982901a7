//! Provider webhook signature verification.
//!
//! The provider signs `"<timestamp>.<raw body>"` with HMAC-SHA256 using the
//! shared secret and sends the lowercase hex digest in `X-Webhook-Signature`
//! alongside the Unix timestamp in `X-Webhook-Timestamp`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::Timestamp;

use super::errors::SignatureRejection;

type HmacSha256 = Hmac<Sha256>;

/// Default replay window in seconds.
pub const DEFAULT_REPLAY_WINDOW_SECS: u64 = 300;

/// Verifier for provider webhook signatures.
///
/// Holds only immutable state; share it behind an `Arc`.
pub struct WebhookSignatureVerifier {
    secret: SecretString,
    replay_window_secs: u64,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: SecretString, replay_window_secs: u64) -> Self {
        Self {
            secret,
            replay_window_secs,
        }
    }

    /// Verifier with the default five minute window.
    pub fn with_default_window(secret: SecretString) -> Self {
        Self::new(secret, DEFAULT_REPLAY_WINDOW_SECS)
    }

    pub fn replay_window_secs(&self) -> u64 {
        self.replay_window_secs
    }

    /// Checks that a callback is authentic and fresh.
    ///
    /// # Verification Steps
    ///
    /// 1. Both headers must be present and non-empty
    /// 2. Timestamp must parse and lie within the window of `now` (either side)
    /// 3. HMAC over the raw bytes must equal the signature (constant-time)
    ///
    /// Each decision is logged; the secret and expected digest never are.
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
        now: Timestamp,
    ) -> Result<(), SignatureRejection> {
        let result = self.check(signature, timestamp, raw_body, now);

        match &result {
            Ok(()) => tracing::info!(timestamp = timestamp, "webhook signature accepted"),
            Err(reason) => tracing::warn!(
                reason = reason.as_str(),
                timestamp = timestamp,
                "webhook signature rejected"
            ),
        }

        result
    }

    fn check(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
        now: Timestamp,
    ) -> Result<(), SignatureRejection> {
        let (signature, timestamp) = match (non_empty(signature), non_empty(timestamp)) {
            (Some(signature), Some(timestamp)) => (signature, timestamp),
            _ => return Err(SignatureRejection::MissingCredentials),
        };

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureRejection::MalformedTimestamp)?;

        if now.as_unix_secs().abs_diff(sent_at) > self.replay_window_secs {
            return Err(SignatureRejection::StaleTimestamp);
        }

        let expected = self.compute_signature(timestamp, raw_body)?;

        if !constant_time_compare(expected.as_bytes(), signature.as_bytes()) {
            return Err(SignatureRejection::SignatureMismatch);
        }

        Ok(())
    }

    /// Hex HMAC-SHA256 of `timestamp ++ "." ++ raw_body`, bytes taken verbatim.
    fn compute_signature(
        &self,
        timestamp: &str,
        raw_body: &[u8],
    ) -> Result<String, SignatureRejection> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureRejection::SignatureMismatch)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(raw_body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a provider-style signature for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "vn_test_secret_12345";
    const NOW: i64 = 1_700_000_000;

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::with_default_window(SecretString::new(TEST_SECRET.to_string()))
    }

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(NOW)
    }

    fn signed(body: &[u8], ts: i64) -> (String, String) {
        let ts = ts.to_string();
        (compute_test_signature(TEST_SECRET, &ts, body), ts)
    }

    // ══════════════════════════════════════════════════════════════
    // Accept
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn accepts_valid_signature_within_window() {
        let body = br#"{"type":"verification.completed","verification_id":"ver_1"}"#;
        let (sig, ts) = signed(body, NOW);

        assert_eq!(verifier().verify(Some(&sig), Some(&ts), body, now()), Ok(()));
    }

    #[test]
    fn accepts_timestamp_exactly_at_window_edge() {
        let body = b"{}";
        let (sig, ts) = signed(body, NOW - 300);
        assert!(verifier().verify(Some(&sig), Some(&ts), body, now()).is_ok());

        let (sig, ts) = signed(body, NOW + 300);
        assert!(verifier().verify(Some(&sig), Some(&ts), body, now()).is_ok());
    }

    #[test]
    fn signs_body_bytes_verbatim_even_when_not_utf8() {
        let body: &[u8] = &[0xff, 0xfe, b'{', b'}'];
        let (sig, ts) = signed(body, NOW);

        assert!(verifier().verify(Some(&sig), Some(&ts), body, now()).is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Reject
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn rejects_missing_signature() {
        let (_, ts) = signed(b"{}", NOW);
        assert_eq!(
            verifier().verify(None, Some(&ts), b"{}", now()),
            Err(SignatureRejection::MissingCredentials)
        );
    }

    #[test]
    fn rejects_missing_timestamp() {
        let (sig, _) = signed(b"{}", NOW);
        assert_eq!(
            verifier().verify(Some(&sig), None, b"{}", now()),
            Err(SignatureRejection::MissingCredentials)
        );
    }

    #[test]
    fn empty_header_counts_as_missing() {
        let (sig, _) = signed(b"{}", NOW);
        assert_eq!(
            verifier().verify(Some(&sig), Some(""), b"{}", now()),
            Err(SignatureRejection::MissingCredentials)
        );
        assert_eq!(
            verifier().verify(Some(""), Some("1700000000"), b"{}", now()),
            Err(SignatureRejection::MissingCredentials)
        );
    }

    #[test]
    fn rejects_timestamp_ten_minutes_old() {
        let (sig, ts) = signed(b"{}", NOW - 600);
        assert_eq!(
            verifier().verify(Some(&sig), Some(&ts), b"{}", now()),
            Err(SignatureRejection::StaleTimestamp)
        );
    }

    #[test]
    fn rejects_timestamp_from_the_future() {
        let (sig, ts) = signed(b"{}", NOW + 301);
        assert_eq!(
            verifier().verify(Some(&sig), Some(&ts), b"{}", now()),
            Err(SignatureRejection::StaleTimestamp)
        );
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let sig = compute_test_signature(TEST_SECRET, "yesterday", b"{}");
        assert_eq!(
            verifier().verify(Some(&sig), Some("yesterday"), b"{}", now()),
            Err(SignatureRejection::MalformedTimestamp)
        );
    }

    #[test]
    fn rejects_signature_made_with_other_secret() {
        let ts = NOW.to_string();
        let sig = compute_test_signature("other_secret", &ts, b"{}");
        assert_eq!(
            verifier().verify(Some(&sig), Some(&ts), b"{}", now()),
            Err(SignatureRejection::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_uppercase_hex() {
        let (sig, ts) = signed(b"{}", NOW);
        assert_eq!(
            verifier().verify(Some(&sig.to_uppercase()), Some(&ts), b"{}", now()),
            Err(SignatureRejection::SignatureMismatch)
        );
    }

    #[test]
    fn custom_window_is_honored() {
        let verifier =
            WebhookSignatureVerifier::new(SecretString::new(TEST_SECRET.to_string()), 30);
        let (sig, ts) = signed(b"{}", NOW - 31);

        assert_eq!(verifier.replay_window_secs(), 30);
        assert_eq!(
            verifier.verify(Some(&sig), Some(&ts), b"{}", now()),
            Err(SignatureRejection::StaleTimestamp)
        );
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let (sig, ts) = signed(b"{}", i64::MIN);
        assert_eq!(
            verifier().verify(Some(&sig), Some(&ts), b"{}", now()),
            Err(SignatureRejection::StaleTimestamp)
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn flipping_any_body_byte_breaks_signature(
            body in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let (sig, ts) = signed(&body, NOW);
            let mut tampered = body.clone();
            let i = index.index(tampered.len());
            tampered[i] ^= flip;

            prop_assert_eq!(
                verifier().verify(Some(&sig), Some(&ts), &tampered, now()),
                Err(SignatureRejection::SignatureMismatch)
            );
        }

        #[test]
        fn flipping_any_signature_char_breaks_signature(
            body in proptest::collection::vec(any::<u8>(), 0..128),
            index in any::<prop::sample::Index>(),
        ) {
            let (sig, ts) = signed(&body, NOW);
            let mut chars: Vec<char> = sig.chars().collect();
            let i = index.index(chars.len());
            chars[i] = if chars[i] == '0' { '1' } else { '0' };
            let tampered: String = chars.into_iter().collect();

            prop_assert_eq!(
                verifier().verify(Some(&tampered), Some(&ts), &body, now()),
                Err(SignatureRejection::SignatureMismatch)
            );
        }

        #[test]
        fn outside_window_is_stale_regardless_of_signature(
            offset in 301i64..1_000_000,
            future in any::<bool>(),
        ) {
            let sent_at = if future { NOW + offset } else { NOW - offset };
            let (sig, ts) = signed(b"{}", sent_at);

            prop_assert_eq!(
                verifier().verify(Some(&sig), Some(&ts), b"{}", now()),
                Err(SignatureRejection::StaleTimestamp)
            );
        }

        #[test]
        fn inside_window_with_valid_signature_is_accepted(offset in -300i64..=300) {
            let (sig, ts) = signed(b"{\"type\":\"x\"}", NOW + offset);

            let accepted = verifier()
                .verify(Some(&sig), Some(&ts), b"{\"type\":\"x\"}", now())
                .is_ok();
            prop_assert!(accepted, "offset {} should be accepted", offset);
        }
    }
}
