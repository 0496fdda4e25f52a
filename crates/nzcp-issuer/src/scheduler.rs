//! # Cache Refresh Scheduler
//!
//! Proactively re-fetches every trusted issuer so verification keeps working
//! offline, and sweeps expired cache entries afterwards.
//!
//! The scheduler holds no hidden state: the caller passes in when the last
//! batch completed and receives the new timestamp in the outcome. [`run`]
//! keeps that timestamp locally while driven by a connectivity channel.
//!
//! [`run`]: CacheRefreshScheduler::run

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;

use crate::resolver::{CacheOptions, IssuerResolver};

/// Network reachability as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Summary of one completed refresh batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// When the batch completed, ms since epoch.
    pub refreshed_at: i64,
    pub succeeded: Vec<String>,
    /// Issuers that failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Expired entries removed after the batch.
    pub purged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// The previous batch is younger than the minimum refresh age.
    #[serde(rename_all = "camelCase")]
    Skipped { last_refresh: i64 },
    Completed(RefreshReport),
}

impl RefreshOutcome {
    /// The last-refresh timestamp to carry forward.
    pub fn last_refresh(&self) -> i64 {
        match self {
            Self::Skipped { last_refresh } => *last_refresh,
            Self::Completed(report) => report.refreshed_at,
        }
    }
}

/// Debounced refresh of all trusted issuers.
#[derive(Debug, Clone)]
pub struct CacheRefreshScheduler {
    resolver: IssuerResolver,
    min_age: Duration,
}

impl CacheRefreshScheduler {
    pub fn new(resolver: IssuerResolver, min_age: Duration) -> Self {
        Self { resolver, min_age }
    }

    /// Refresh every trusted issuer unless the last batch, completed at
    /// `last_refresh`, is younger than the minimum age.
    ///
    /// Individual issuer failures are logged and reported; they never abort
    /// the batch.
    pub async fn refresh(&self, last_refresh: Option<i64>) -> RefreshOutcome {
        let clock = self.resolver.cache().clock().clone();
        let min_age_ms = i64::try_from(self.min_age.as_millis()).unwrap_or(i64::MAX);

        if let Some(last) = last_refresh {
            if clock.now_ms() < last.saturating_add(min_age_ms) {
                tracing::debug!(last_refresh = last, "issuer cache refresh skipped");
                return RefreshOutcome::Skipped { last_refresh: last };
            }
        }

        let issuers = self.resolver.trusted_issuers().to_vec();
        let results = join_all(issuers.iter().map(|issuer| {
            self.resolver
                .cache_issuer(issuer, CacheOptions { force: true })
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (issuer, result) in issuers.into_iter().zip(results) {
            match result {
                Ok(()) => succeeded.push(issuer),
                Err(e) => {
                    tracing::warn!(issuer = %issuer, "issuer cache refresh failed: {e}");
                    failed.push((issuer, e.to_string()));
                }
            }
        }

        let purged = self.resolver.cache().purge_expired();
        let report = RefreshReport {
            refreshed_at: clock.now_ms(),
            succeeded,
            failed,
            purged,
        };
        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            purged = report.purged,
            "issuer cache refresh completed"
        );
        RefreshOutcome::Completed(report)
    }

    /// Called when connectivity is restored.
    pub async fn on_connectivity_restored(&self, last_refresh: Option<i64>) -> RefreshOutcome {
        self.refresh(last_refresh).await
    }

    /// Refresh on every transition to [`Connectivity::Online`], until the
    /// sender side of `connectivity` is dropped. Returns the last refresh
    /// timestamp.
    pub async fn run(
        &self,
        mut connectivity: watch::Receiver<Connectivity>,
        mut last_refresh: Option<i64>,
    ) -> Option<i64> {
        let mut was_online = false;
        loop {
            let online = *connectivity.borrow_and_update() == Connectivity::Online;
            if online && !was_online {
                let outcome = self.on_connectivity_restored(last_refresh).await;
                last_refresh = Some(outcome.last_refresh());
            }
            was_online = online;

            if connectivity.changed().await.is_err() {
                tracing::debug!("connectivity channel closed, stopping refresh scheduler");
                return last_refresh;
            }
        }
    }
}
