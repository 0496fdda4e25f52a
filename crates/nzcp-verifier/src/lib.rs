//! # nzcp-verifier — NZ COVID Pass Verification
//!
//! Turns a scanned QR string into a [`VerificationResult`]:
//!
//! - **Payload codec** ([`payload`]): `NZCP:/1/<base32>` envelope parsing.
//! - **Credential verifier** ([`credential`]): COSE_Sign1 + CWT checks
//!   against the issuer key resolved through `nzcp-issuer`.
//! - **Orchestrator** ([`Verifier`]): total mapping of every failure into
//!   `Valid`, `Invalid`, `CannotRead` or `CannotValidate`, with timing,
//!   result publication and analytics.
//!
//! ## Example
//!
//! ```ignore
//! let verifier = Verifier::new(&config, resolver);
//! let verification = verifier.verify_payload("NZCP:/1/2KCEVIQEIVVWK6...").await;
//! println!("{}", verification.result.status());
//! ```
//!
//! [`VerificationResult`]: nzcp_core::VerificationResult

pub mod analytics;
pub mod credential;
pub mod orchestrator;
pub mod payload;

pub use analytics::{
    AnalyticsError, AnalyticsEvent, AnalyticsSink, NoopAnalyticsSink, TracingAnalyticsSink,
};
pub use credential::{VerifiedClaims, VerifyFailure};
pub use orchestrator::{CancellationToken, ResultSink, Verifier};
pub use payload::{DecodedEnvelope, PayloadError};
