//! # Verification Outcome Taxonomy
//!
//! The closed set of results the verification pipeline can produce. Every
//! internal failure (envelope, issuer resolution, signature, claims) is
//! translated into exactly one [`VerificationResult`] case before it leaves
//! the orchestrator. No internal error type is visible to consumers.
//!
//! | Case | Meaning |
//! |------|---------|
//! | `Valid` | Signature and claims check out |
//! | `Invalid` | Confident negative determination, see [`InvalidReason`] |
//! | `CannotRead` | Malformed payload or unsupported encoding/algorithm |
//! | `CannotValidate` | Issuer key unreachable; the pass may still be genuine |

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar date rendered for display.
///
/// Day and month are always two digits, year always four.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateStrings {
    pub day: String,
    pub month: String,
    pub year: String,
}

impl DateStrings {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: format!("{:02}", date.day()),
            month: format!("{:02}", date.month()),
            year: format!("{:04}", date.year()),
        }
    }

    /// Render an instant as the calendar date it falls on at `offset`.
    pub fn from_instant(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::from_date(at.with_timezone(&offset).date_naive())
    }
}

impl fmt::Display for DateStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.day, self.month, self.year)
    }
}

/// Why a credential was confidently rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidReason {
    IssuerNotTrusted,
    IssuerPublicKeyInvalid,
    SignatureInvalid,
    CredentialExpired,
    CredentialNotActive,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuerNotTrusted => "IssuerNotTrusted",
            Self::IssuerPublicKeyInvalid => "IssuerPublicKeyInvalid",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::CredentialExpired => "CredentialExpired",
            Self::CredentialNotActive => "CredentialNotActive",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome class without details, for presentation routing and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Valid,
    Invalid,
    CannotRead,
    CannotValidate,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Invalid => "Invalid",
            Self::CannotRead => "CannotRead",
            Self::CannotValidate => "CannotValidate",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of verifying one scanned payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum VerificationResult {
    Valid {
        #[serde(rename = "givenName")]
        given_name: String,
        #[serde(rename = "familyName", default, skip_serializing_if = "Option::is_none")]
        family_name: Option<String>,
        dob: DateStrings,
        expiry: DateStrings,
    },
    Invalid {
        reason: InvalidReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expiry: Option<DateStrings>,
        #[serde(
            rename = "expiredDurationDays",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        expired_duration_days: Option<f64>,
    },
    CannotRead,
    CannotValidate,
}

impl VerificationResult {
    /// An `Invalid` result that carries no expiry details.
    pub fn invalid(reason: InvalidReason) -> Self {
        Self::Invalid {
            reason,
            expiry: None,
            expired_duration_days: None,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        match self {
            Self::Valid { .. } => VerificationStatus::Valid,
            Self::Invalid { .. } => VerificationStatus::Invalid,
            Self::CannotRead => VerificationStatus::CannotRead,
            Self::CannotValidate => VerificationStatus::CannotValidate,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Invalid { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// The label reported for a failed scan: the invalid reason when there
    /// is one, the status otherwise. `None` for valid results.
    pub fn failure_label(&self) -> Option<&'static str> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { reason, .. } => Some(reason.as_str()),
            other => Some(other.status().as_str()),
        }
    }
}

/// A verification result together with how long it took to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub result: VerificationResult,
    #[serde(rename = "processedInMs")]
    pub processing_ms: u64,
}
