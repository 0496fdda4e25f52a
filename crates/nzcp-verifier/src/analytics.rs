//! # Scan Analytics
//!
//! One event per completed verification:
//!
//! | Event | Attributes | Metrics |
//! |-------|------------|---------|
//! | `scanValid` | none | `processedInMs` |
//! | `scanInvalid` | `reason` | `processedInMs` |
//!
//! `reason` is the [`InvalidReason`](nzcp_core::InvalidReason) name for
//! invalid passes, otherwise `CannotRead` or `CannotValidate`. Events never
//! carry personal data.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use nzcp_core::Verification;

pub const SCAN_VALID: &str = "scanValid";
pub const SCAN_INVALID: &str = "scanInvalid";

/// A named event with string attributes and numeric metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub attributes: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
}

impl AnalyticsEvent {
    /// The event describing a completed verification.
    pub fn for_verification(verification: &Verification) -> Self {
        let mut attributes = BTreeMap::new();
        let name = match verification.result.failure_label() {
            None => SCAN_VALID,
            Some(reason) => {
                attributes.insert("reason".to_string(), reason.to_string());
                SCAN_INVALID
            }
        };
        let mut metrics = BTreeMap::new();
        metrics.insert("processedInMs".to_string(), verification.processing_ms as f64);
        Self {
            name,
            attributes,
            metrics,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("analytics delivery failed: {0}")]
pub struct AnalyticsError(pub String);

/// Destination for analytics events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Emits events as `tracing` records under the `nzcp::analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalyticsSink;

#[async_trait]
impl AnalyticsSink for TracingAnalyticsSink {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        let attributes =
            serde_json::to_string(&event.attributes).map_err(|e| AnalyticsError(e.to_string()))?;
        let metrics =
            serde_json::to_string(&event.metrics).map_err(|e| AnalyticsError(e.to_string()))?;
        tracing::info!(target: "nzcp::analytics", event = event.name, %attributes, %metrics, "analytics event");
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyticsSink;

#[async_trait]
impl AnalyticsSink for NoopAnalyticsSink {
    async fn record_event(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}
