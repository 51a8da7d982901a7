//! Status, result and type enumerations shared by verification records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Processing status of a verification or authentication.
///
/// Moves forward only: `Pending -> Processing -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Requested, provider has not started.
    Pending,
    /// Provider is working on it.
    Processing,
    /// Provider finished and reported a result.
    Completed,
    /// Provider gave up or the subject was rejected outright.
    Failed,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Processing => "processing",
            VerificationStatus::Completed => "completed",
            VerificationStatus::Failed => "failed",
        }
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationStatus::Completed | VerificationStatus::Failed)
    }
}

impl Default for VerificationStatus {
    fn default() -> Self {
        VerificationStatus::Pending
    }
}

impl FromStr for VerificationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "processing" => Ok(VerificationStatus::Processing),
            "completed" => Ok(VerificationStatus::Completed),
            "failed" => Ok(VerificationStatus::Failed),
            other => Err(ValidationError::invalid_value(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Approved,
    Rejected,
    Pending,
}

impl VerificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationResult::Approved => "approved",
            VerificationResult::Rejected => "rejected",
            VerificationResult::Pending => "pending",
        }
    }
}

impl Default for VerificationResult {
    fn default() -> Self {
        VerificationResult::Pending
    }
}

impl FromStr for VerificationResult {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(VerificationResult::Approved),
            "rejected" => Ok(VerificationResult::Rejected),
            "pending" => Ok(VerificationResult::Pending),
            other => Err(ValidationError::invalid_value(
                "result",
                format!("unknown result '{}'", other),
            )),
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of check that was requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationType {
    /// Identity document verification.
    Idv,
    /// Facial authentication against a prior verification.
    Authentication,
    AgeVerification,
}

impl VerificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationType::Idv => "idv",
            VerificationType::Authentication => "authentication",
            VerificationType::AgeVerification => "age_verification",
        }
    }
}

impl Default for VerificationType {
    fn default() -> Self {
        VerificationType::Idv
    }
}

impl FromStr for VerificationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idv" => Ok(VerificationType::Idv),
            "authentication" => Ok(VerificationType::Authentication),
            "age_verification" => Ok(VerificationType::AgeVerification),
            other => Err(ValidationError::invalid_value(
                "type",
                format!("unknown verification type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for VerificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
