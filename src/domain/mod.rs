//! Domain layer - Records, value objects and webhook rules.
//!
//! Has no knowledge of HTTP or SQL; adapters reach it through `ports`.

pub mod foundation;
pub mod verification;
pub mod webhook;
