//! Verifier configuration.
//!
//! Static settings supplied once at startup: which issuers are trusted, how
//! long resolved issuer keys may be cached, how often the cache may be
//! proactively refreshed, and how long an issuer key fetch may take.
//! Defaults target the production NZCP issuer. Override via environment
//! variables or explicit construction for staging/testing.

use std::time::Duration;

/// Production NZCP issuer.
pub const DEFAULT_TRUSTED_ISSUER: &str = "did:web:nzcp.identity.health.nz";

const DAY_MS: u64 = 24 * 60 * 60 * 1000;
const DEFAULT_CACHE_MAX_AGE_MS: u64 = 14 * DAY_MS;
const DEFAULT_REFRESH_MIN_AGE_MS: u64 = 60 * 60 * 1000;
const DEFAULT_RESOLUTION_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the verification pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Issuer identifiers (DIDs) whose credentials may be accepted.
    /// Ordered, without duplicates.
    pub trusted_issuers: Vec<String>,
    /// How long a resolved issuer document stays usable in the cache.
    pub issuer_cache_max_age: Duration,
    /// Minimum time between two proactive cache refresh batches.
    pub issuer_cache_refresh_min_age: Duration,
    /// Timeout for a single issuer document fetch.
    pub issuer_resolution_request_timeout: Duration,
    /// Whether scan analytics events are emitted.
    pub analytics_enabled: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::new([DEFAULT_TRUSTED_ISSUER])
    }
}

impl VerifierConfig {
    /// Configuration with default timings for the given trusted issuers.
    pub fn new<I, S>(trusted_issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted_issuers: dedup_ordered(trusted_issuers.into_iter().map(Into::into)),
            issuer_cache_max_age: Duration::from_millis(DEFAULT_CACHE_MAX_AGE_MS),
            issuer_cache_refresh_min_age: Duration::from_millis(DEFAULT_REFRESH_MIN_AGE_MS),
            issuer_resolution_request_timeout: Duration::from_millis(DEFAULT_RESOLUTION_TIMEOUT_MS),
            analytics_enabled: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `TRUSTED_ISSUER_LIST` comma-separated DIDs (default: `did:web:nzcp.identity.health.nz`)
    /// - `ISSUER_CACHE_MAX_AGE_MS` (default: 14 days)
    /// - `ISSUER_CACHE_REFRESH_MIN_AGE_MS` (default: 1 hour)
    /// - `ISSUER_RESOLUTION_REQUEST_TIMEOUT_MS` (default: 10 seconds)
    /// - `ANALYTICS_ENABLED` `true`/`false` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let trusted_issuers = match lookup("TRUSTED_ISSUER_LIST") {
            Some(raw) => parse_issuer_list(&raw),
            None => vec![DEFAULT_TRUSTED_ISSUER.to_string()],
        };
        if trusted_issuers.is_empty() {
            return Err(ConfigError::NoTrustedIssuers);
        }

        Ok(Self {
            trusted_issuers,
            issuer_cache_max_age: env_millis(
                &lookup,
                "ISSUER_CACHE_MAX_AGE_MS",
                DEFAULT_CACHE_MAX_AGE_MS,
            )?,
            issuer_cache_refresh_min_age: env_millis(
                &lookup,
                "ISSUER_CACHE_REFRESH_MIN_AGE_MS",
                DEFAULT_REFRESH_MIN_AGE_MS,
            )?,
            issuer_resolution_request_timeout: env_millis(
                &lookup,
                "ISSUER_RESOLUTION_REQUEST_TIMEOUT_MS",
                DEFAULT_RESOLUTION_TIMEOUT_MS,
            )?,
            analytics_enabled: env_bool(&lookup, "ANALYTICS_ENABLED", false)?,
        })
    }

    pub fn is_trusted(&self, issuer: &str) -> bool {
        self.trusted_issuers.iter().any(|i| i == issuer)
    }

    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.issuer_cache_max_age = max_age;
        self
    }

    pub fn with_refresh_min_age(mut self, min_age: Duration) -> Self {
        self.issuer_cache_refresh_min_age = min_age;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.issuer_resolution_request_timeout = timeout;
        self
    }

    pub fn with_analytics(mut self, enabled: bool) -> Self {
        self.analytics_enabled = enabled;
        self
    }
}

fn parse_issuer_list(raw: &str) -> Vec<String> {
    dedup_ordered(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    )
}

fn dedup_ordered(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn env_millis<F>(lookup: &F, var: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(Duration::from_millis(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
    }
}

fn env_bool<F>(lookup: &F, var: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(var.to_string(), raw)),
        },
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TRUSTED_ISSUER_LIST must name at least one issuer")]
    NoTrustedIssuers,
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}
