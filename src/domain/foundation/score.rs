//! Score value object (0-100 scale, fractional).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A provider-reported score between 0 and 100 inclusive.
///
/// Used for confidence, liveness and face match scores.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Zero score, the default when the provider omits one.
    pub const ZERO: Self = Self(0.0);

    /// Upper bound of the scale.
    pub const MAX: f64 = 100.0;

    /// Creates a Score, returning error if out of range or not finite.
    pub fn try_new(field: &str, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=Self::MAX).contains(&value) {
            return Err(ValidationError::out_of_range(field, 0.0, Self::MAX, value));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true if the score is strictly above `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.0 > threshold
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<f64> for Score {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new("score", value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
