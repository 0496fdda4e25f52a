//! Issuer resolution error types.

use nzcp_crypto::CryptoError;

/// Errors from retrieving an issuer document over the network.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure: DNS, connection refused, TLS, reset.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },
    /// The request exceeded its deadline.
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// The server answered, but the body is not a DID document.
    #[error("malformed issuer document from {url}: {reason}")]
    InvalidDocument { url: String, reason: String },
    /// The issuer identifier cannot be mapped to a document location.
    #[error("unsupported issuer identifier {0}")]
    UnsupportedIssuer(String),
}

/// Errors from resolving an issuer to its key document.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The issuer is not in the trusted list. No fetch was attempted.
    #[error("issuer {0} is not trusted")]
    NotTrusted(String),
    /// The issuer could not be reached.
    #[error("issuer unreachable: {0}")]
    Network(String),
    /// Resolution exceeded the configured request timeout.
    #[error("issuer resolution timed out: {0}")]
    Timeout(String),
    /// The issuer was reached but its document is unusable.
    #[error("invalid issuer document: {0}")]
    InvalidDocument(String),
}

impl ResolveError {
    /// Whether the failure says nothing about the credential itself.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

impl From<FetchError> for ResolveError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network { .. } | FetchError::Status { .. } => Self::Network(err.to_string()),
            FetchError::Timeout { .. } => Self::Timeout(err.to_string()),
            FetchError::InvalidDocument { .. } | FetchError::UnsupportedIssuer(_) => {
                Self::InvalidDocument(err.to_string())
            }
        }
    }
}

/// Problems selecting a usable assertion key from a DID document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document id {found} does not match issuer {expected}")]
    IdMismatch { expected: String, found: String },
    #[error("key {0} is not listed in assertionMethod")]
    KeyNotAuthorized(String),
    #[error("verification method {0} not found")]
    KeyNotFound(String),
    #[error("verification method {0} has no publicKeyJwk")]
    MissingJwk(String),
    #[error("verification method {id}: {source}")]
    InvalidKey { id: String, source: CryptoError },
}

/// Persistence failures of a file-backed store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("corrupt issuer store {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
}
