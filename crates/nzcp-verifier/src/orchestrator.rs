//! # Verification Orchestrator
//!
//! Entry point for a scanned payload. Runs the codec and the credential
//! verifier, then folds every outcome into one of the four
//! [`VerificationResult`] cases.
//!
//! ## Guarantees
//!
//! - Total: any input string yields a result; no internal error escapes.
//! - Exactly one analytics event per completed verification, when enabled.
//! - A cancelled verification publishes nothing and records no event. Cache
//!   writes it already made remain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use nzcp_core::{
    Clock, DateStrings, InvalidReason, Verification, VerificationResult, VerifierConfig,
};
use nzcp_issuer::IssuerResolver;

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::credential::{self, VerifiedClaims, VerifyFailure};
use crate::payload;

const DAY_MS: f64 = 86_400_000.0;

/// Cooperative cancellation flag for an in-flight verification.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Consumer of completed verifications, such as a UI state store.
pub trait ResultSink: Send + Sync {
    fn publish(&self, verification: &Verification);
}

/// Verifies scanned NZCP payloads.
#[derive(Clone)]
pub struct Verifier {
    resolver: IssuerResolver,
    clock: Arc<dyn Clock>,
    analytics_enabled: bool,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    results: Option<Arc<dyn ResultSink>>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("resolver", &self.resolver)
            .field("analytics_enabled", &self.analytics_enabled)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// A verifier that reads time from the resolver's cache clock.
    pub fn new(config: &VerifierConfig, resolver: IssuerResolver) -> Self {
        let clock = resolver.cache().clock().clone();
        Self {
            resolver,
            clock,
            analytics_enabled: config.analytics_enabled,
            analytics: None,
            results: None,
        }
    }

    /// Deliver scan events to `sink`. Ignored unless analytics is enabled
    /// in the configuration.
    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    /// Publish every completed verification to `sink`.
    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.results = Some(sink);
        self
    }

    pub fn resolver(&self) -> &IssuerResolver {
        &self.resolver
    }

    /// Verify `raw` to completion.
    pub async fn verify_payload(&self, raw: &str) -> Verification {
        let started = Instant::now();
        let result = self.evaluate(raw).await;
        self.complete(result, started)
    }

    /// Verify `raw`, abandoning the result if `token` is cancelled while
    /// the issuer lookup is in flight.
    pub async fn verify_payload_with_cancel(
        &self,
        raw: &str,
        token: &CancellationToken,
    ) -> Option<Verification> {
        let started = Instant::now();
        let result = self.evaluate(raw).await;
        if token.is_cancelled() {
            tracing::debug!("verification cancelled, discarding result");
            return None;
        }
        Some(self.complete(result, started))
    }

    async fn evaluate(&self, raw: &str) -> VerificationResult {
        let envelope = match payload::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!("payload rejected: {e}");
                return VerificationResult::CannotRead;
            }
        };
        let outcome = credential::verify(&envelope, &self.resolver, self.clock.as_ref()).await;
        self.classify(outcome)
    }

    fn classify(&self, outcome: Result<VerifiedClaims, VerifyFailure>) -> VerificationResult {
        let failure = match outcome {
            Ok(claims) => {
                return VerificationResult::Valid {
                    given_name: claims.given_name,
                    family_name: claims.family_name,
                    dob: DateStrings::from_date(claims.dob),
                    expiry: self.date_strings(claims.expiry),
                }
            }
            Err(failure) => failure,
        };
        tracing::debug!("credential rejected: {failure}");

        match failure {
            VerifyFailure::PayloadInvalid(_) | VerifyFailure::UnsupportedAlgorithm(_) => {
                VerificationResult::CannotRead
            }
            VerifyFailure::Resolve(e) if e.is_indeterminate() => VerificationResult::CannotValidate,
            VerifyFailure::Resolve(nzcp_issuer::ResolveError::NotTrusted(_)) => {
                VerificationResult::invalid(InvalidReason::IssuerNotTrusted)
            }
            VerifyFailure::Resolve(_) | VerifyFailure::IssuerKey(_) => {
                VerificationResult::invalid(InvalidReason::IssuerPublicKeyInvalid)
            }
            VerifyFailure::SignatureInvalid => {
                VerificationResult::invalid(InvalidReason::SignatureInvalid)
            }
            VerifyFailure::Expired { expiry: None } => {
                VerificationResult::invalid(InvalidReason::CredentialExpired)
            }
            VerifyFailure::Expired {
                expiry: Some(expiry),
            } => {
                let elapsed_ms = (self.clock.now() - expiry).num_milliseconds().abs();
                VerificationResult::Invalid {
                    reason: InvalidReason::CredentialExpired,
                    expiry: Some(self.date_strings(expiry)),
                    expired_duration_days: Some(elapsed_ms as f64 / DAY_MS),
                }
            }
            VerifyFailure::NotActive { .. } => {
                VerificationResult::invalid(InvalidReason::CredentialNotActive)
            }
        }
    }

    fn date_strings(&self, at: DateTime<Utc>) -> DateStrings {
        DateStrings::from_instant(at, self.clock.display_offset(at))
    }

    fn complete(&self, result: VerificationResult, started: Instant) -> Verification {
        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let verification = Verification {
            result,
            processing_ms,
        };
        tracing::info!(
            outcome = %verification.result.status(),
            reason = verification.result.failure_label().unwrap_or("-"),
            elapsed_ms = processing_ms,
            "verification completed"
        );

        if let Some(results) = &self.results {
            results.publish(&verification);
        }
        self.record(&verification);
        verification
    }

    fn record(&self, verification: &Verification) {
        if !self.analytics_enabled {
            return;
        }
        let Some(sink) = self.analytics.clone() else {
            return;
        };
        let event = AnalyticsEvent::for_verification(verification);
        tokio::spawn(async move {
            if let Err(e) = sink.record_event(event).await {
                tracing::debug!("dropping analytics event: {e}");
            }
        });
    }
}
