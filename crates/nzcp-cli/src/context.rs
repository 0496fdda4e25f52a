//! Wiring shared by every subcommand: configuration, the persisted issuer
//! store, and the resolver built over them.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use nzcp_core::{Clock, SystemClock, VerifierConfig};
use nzcp_issuer::{
    DidWebFetcher, IssuerCache, IssuerResolver, JsonFileIssuerStore, KeyDocumentFetcher,
    OfflineFetcher,
};

/// The assembled pipeline for one CLI invocation.
pub struct Pipeline {
    pub config: VerifierConfig,
    pub store: Arc<JsonFileIssuerStore>,
    pub resolver: IssuerResolver,
}

impl Pipeline {
    /// Load configuration from the environment and open the store at
    /// `store_path`. With `offline`, issuers are only read from the cache.
    pub fn open(store_path: &Path, offline: bool) -> Result<Self> {
        let config = VerifierConfig::from_env().context("invalid verifier configuration")?;
        Self::with_config(config, store_path, offline)
    }

    pub fn with_config(config: VerifierConfig, store_path: &Path, offline: bool) -> Result<Self> {
        let store = Arc::new(
            JsonFileIssuerStore::open(store_path)
                .with_context(|| format!("opening issuer store {}", store_path.display()))?,
        );
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = IssuerCache::new(store.clone(), clock, config.issuer_cache_max_age);

        let fetcher: Arc<dyn KeyDocumentFetcher> = if offline {
            Arc::new(OfflineFetcher)
        } else {
            Arc::new(
                DidWebFetcher::new(config.issuer_resolution_request_timeout)
                    .context("building HTTP client")?,
            )
        };
        let resolver = IssuerResolver::new(&config, cache, fetcher);

        tracing::debug!(
            store = %store_path.display(),
            trusted = config.trusted_issuers.len(),
            offline,
            "pipeline ready"
        );
        Ok(Self {
            config,
            store,
            resolver,
        })
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
