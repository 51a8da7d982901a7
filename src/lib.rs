//! VerifyNow Gateway - signed webhook receiver for identity verification.
//!
//! Authenticates VerifyNow callbacks with HMAC-SHA256 and a replay window,
//! applies them to verification and authentication records, and publishes
//! notifications for terminal outcomes.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
