//! # Issuer Cache
//!
//! TTL-bounded view over an [`IssuerStore`]. Entries expire `max_age` after
//! they were written.
//!
//! ## Invariants
//!
//! - An entry whose `ttl` is strictly before now is never returned by
//!   [`IssuerCache::get`]. An entry with `ttl == now` is still valid.
//! - Reads never delete. Expired entries stay in the store until
//!   [`IssuerCache::purge_expired`] sweeps them.
//! - Writes overwrite unconditionally; the last write wins.

use std::sync::Arc;
use std::time::Duration;

use nzcp_core::Clock;

use crate::did::DidDocument;
use crate::store::{CachedIssuer, IssuerStore};

/// Time-bounded cache of issuer documents.
#[derive(Clone)]
pub struct IssuerCache {
    store: Arc<dyn IssuerStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl std::fmt::Debug for IssuerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerCache")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl IssuerCache {
    pub fn new(store: Arc<dyn IssuerStore>, clock: Arc<dyn Clock>, max_age: Duration) -> Self {
        Self {
            store,
            clock,
            max_age,
        }
    }

    /// The clock the cache measures expiry against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The cached document for `issuer`, unless absent or expired.
    pub fn get(&self, issuer: &str) -> Option<DidDocument> {
        let entry = self.store.get_cached_item(issuer)?;
        let now = self.clock.now_ms();
        if entry.ttl < now {
            tracing::debug!(issuer, ttl = entry.ttl, "issuer cache entry expired");
            return None;
        }
        Some(entry.value)
    }

    /// Store `document` for `issuer`, valid for `max_age` from now.
    pub fn set(&self, issuer: &str, document: DidDocument) -> bool {
        let now = self.clock.now_ms();
        let max_age_ms = i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX);
        self.store.set_cached_item(
            issuer,
            CachedIssuer {
                ttl: now.saturating_add(max_age_ms),
                value: document,
                updated_timestamp: now,
            },
        );
        true
    }

    /// Delete every entry that has expired. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .store
            .entries()
            .into_iter()
            .filter(|(_, entry)| entry.ttl < now)
            .map(|(key, _)| key)
            .collect();
        for key in &expired {
            self.store.delete_cached_item(key);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "purged expired issuer cache entries");
        }
        expired.len()
    }

    /// Most recent write time across all entries, ms since epoch.
    pub fn last_updated(&self) -> Option<i64> {
        self.store
            .entries()
            .into_iter()
            .map(|(_, entry)| entry.updated_timestamp)
            .max()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
