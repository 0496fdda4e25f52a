//! # Issuer Resolver
//!
//! Turns an issuer identifier into its DID document:
//!
//! 1. Trust gate. Issuers outside the trusted list fail with
//!    [`ResolveError::NotTrusted`] before any cache read or fetch.
//! 2. Cache read-through. A live cache entry is returned as-is.
//! 3. Fetch, bounded by the configured request timeout.
//! 4. Validate that the document belongs to the issuer, then write it back
//!    to the cache.
//!
//! Concurrent resolutions of the same issuer may both fetch; both write, and
//! the last write wins.

use std::sync::Arc;
use std::time::Duration;

use nzcp_core::VerifierConfig;

use crate::cache::IssuerCache;
use crate::did::DidDocument;
use crate::error::ResolveError;
use crate::fetch::KeyDocumentFetcher;

/// Options for [`IssuerResolver::cache_issuer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Skip the cache read and always fetch.
    pub force: bool,
}

/// Resolves trusted issuers through the cache and the network.
#[derive(Clone)]
pub struct IssuerResolver {
    trusted: Arc<[String]>,
    cache: IssuerCache,
    fetcher: Arc<dyn KeyDocumentFetcher>,
    timeout: Duration,
}

impl std::fmt::Debug for IssuerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerResolver")
            .field("trusted", &self.trusted)
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl IssuerResolver {
    pub fn new(
        config: &VerifierConfig,
        cache: IssuerCache,
        fetcher: Arc<dyn KeyDocumentFetcher>,
    ) -> Self {
        Self {
            trusted: config.trusted_issuers.clone().into(),
            cache,
            fetcher,
            timeout: config.issuer_resolution_request_timeout,
        }
    }

    pub fn trusted_issuers(&self) -> &[String] {
        &self.trusted
    }

    pub fn cache(&self) -> &IssuerCache {
        &self.cache
    }

    pub fn is_trusted(&self, issuer: &str) -> bool {
        self.trusted.iter().any(|t| t == issuer)
    }

    /// Resolve `issuer` to its DID document, preferring the cache.
    pub async fn resolve(&self, issuer: &str) -> Result<DidDocument, ResolveError> {
        self.lookup(issuer, CacheOptions::default()).await
    }

    /// Populate the cache for `issuer`. With `force`, the cache is bypassed
    /// and the document is always re-fetched.
    pub async fn cache_issuer(&self, issuer: &str, options: CacheOptions) -> Result<(), ResolveError> {
        self.lookup(issuer, options).await.map(|_| ())
    }

    async fn lookup(&self, issuer: &str, options: CacheOptions) -> Result<DidDocument, ResolveError> {
        if !self.is_trusted(issuer) {
            tracing::debug!(issuer, "rejecting untrusted issuer");
            return Err(ResolveError::NotTrusted(issuer.to_string()));
        }

        if !options.force {
            if let Some(document) = self.cache.get(issuer) {
                tracing::debug!(issuer, "issuer cache hit");
                return Ok(document);
            }
            tracing::debug!(issuer, "issuer cache miss");
        }

        let document = match tokio::time::timeout(self.timeout, self.fetcher.fetch(issuer)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ResolveError::Timeout(format!(
                    "{issuer} after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        document
            .ensure_issuer(issuer)
            .map_err(|e| ResolveError::InvalidDocument(e.to_string()))?;

        self.cache.set(issuer, document.clone());
        tracing::debug!(issuer, "issuer document cached");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::store::InMemoryIssuerStore;
    use async_trait::async_trait;
    use nzcp_core::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ISSUER: &str = "did:web:nzcp.identity.health.nz";
    const NOW: i64 = 1_700_000_000_000;

    fn document(id: &str) -> DidDocument {
        DidDocument {
            context: None,
            id: id.into(),
            verification_method: vec![],
            assertion_method: vec![],
        }
    }

    enum Behaviour {
        Serve(&'static str),
        Fail,
        Hang,
    }

    struct CountingFetcher {
        calls: AtomicUsize,
        behaviour: Behaviour,
    }

    impl CountingFetcher {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behaviour,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeyDocumentFetcher for CountingFetcher {
        async fn fetch(&self, issuer: &str) -> Result<DidDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Serve(id) => Ok(document(id)),
                Behaviour::Fail => Err(FetchError::Network {
                    url: issuer.into(),
                    reason: "connection refused".into(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(document(issuer))
                }
            }
        }
    }

    fn resolver(fetcher: Arc<CountingFetcher>) -> IssuerResolver {
        let config = VerifierConfig::new([ISSUER]).with_request_timeout(Duration::from_millis(50));
        let cache = IssuerCache::new(
            Arc::new(InMemoryIssuerStore::new()),
            Arc::new(FixedClock::from_millis(NOW)),
            config.issuer_cache_max_age,
        );
        IssuerResolver::new(&config, cache, fetcher)
    }

    #[tokio::test]
    async fn untrusted_issuer_is_rejected_without_fetching() {
        let fetcher = CountingFetcher::new(Behaviour::Serve("did:web:evil.example"));
        let resolver = resolver(fetcher.clone());
        let err = resolver.resolve("did:web:evil.example").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotTrusted(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn second_resolution_is_served_from_cache() {
        let fetcher = CountingFetcher::new(Behaviour::Serve(ISSUER));
        let resolver = resolver(fetcher.clone());
        resolver.resolve(ISSUER).await.unwrap();
        resolver.resolve(ISSUER).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn forced_caching_always_fetches() {
        let fetcher = CountingFetcher::new(Behaviour::Serve(ISSUER));
        let resolver = resolver(fetcher.clone());
        resolver.resolve(ISSUER).await.unwrap();
        resolver
            .cache_issuer(ISSUER, CacheOptions { force: true })
            .await
            .unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn network_failure_is_indeterminate() {
        let resolver = resolver(CountingFetcher::new(Behaviour::Fail));
        let err = resolver.resolve(ISSUER).await.unwrap_err();
        assert!(matches!(err, ResolveError::Network(_)));
        assert!(resolver.cache().get(ISSUER).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let resolver = resolver(CountingFetcher::new(Behaviour::Hang));
        let err = resolver.resolve(ISSUER).await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout(_)));
    }

    #[tokio::test]
    async fn document_for_another_issuer_is_invalid_and_not_cached() {
        let resolver = resolver(CountingFetcher::new(Behaviour::Serve("did:web:other.example")));
        let err = resolver.resolve(ISSUER).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDocument(_)));
        assert!(resolver.cache().get(ISSUER).is_none());
    }
}
