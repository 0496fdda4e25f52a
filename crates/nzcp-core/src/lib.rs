//! # nzcp-core — Foundational Types for the NZCP Verifier
//!
//! Shared building blocks for every other crate in the workspace:
//!
//! - **Configuration** ([`VerifierConfig`]): trusted issuer list and the
//!   cache/refresh/timeout knobs, loaded from environment variables.
//! - **Outcome taxonomy** ([`VerificationResult`], [`InvalidReason`]): the
//!   closed, four-case result the verification pipeline produces.
//! - **Date rendering** ([`DateStrings`]): zero-padded day/month and
//!   four-digit year strings for display.
//! - **Clock** ([`Clock`]): injectable time source so temporal checks and
//!   cache expiry are testable.
//! - **Freshness** ([`CacheStatus`]): how close the issuer cache is to going
//!   stale.
//!
//! ## Crate Policy
//!
//! No I/O and no async. Everything here is plain data plus pure functions.

pub mod clock;
pub mod config;
pub mod freshness;
pub mod outcome;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, VerifierConfig};
pub use freshness::{cache_status, CacheStatus};
pub use outcome::{DateStrings, InvalidReason, Verification, VerificationResult, VerificationStatus};
