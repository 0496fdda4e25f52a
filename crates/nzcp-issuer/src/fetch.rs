//! # Issuer Document Fetching
//!
//! Network retrieval of issuer DID documents. The resolver depends only on
//! the [`KeyDocumentFetcher`] trait so hosts and tests can substitute their
//! own transport.
//!
//! ## did:web
//!
//! [`DidWebFetcher`] maps a `did:web` identifier to an HTTPS URL:
//!
//! - `did:web:example.com` → `https://example.com/.well-known/did.json`
//! - `did:web:example.com:issuers:nz` → `https://example.com/issuers/nz/did.json`
//! - `%3A` in the host segment decodes to `:` (an explicit port).
//!
//! ## Timeout
//!
//! The underlying `reqwest::Client` carries a per-request timeout. The
//! resolver additionally bounds the whole fetch, so a slow body read cannot
//! outlive the configured deadline.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::did::DidDocument;
use crate::error::FetchError;

const DID_WEB_PREFIX: &str = "did:web:";

/// Retrieves the DID document of an issuer.
#[async_trait]
pub trait KeyDocumentFetcher: Send + Sync {
    async fn fetch(&self, issuer: &str) -> Result<DidDocument, FetchError>;
}

/// HTTPS `did:web` resolver.
#[derive(Debug, Clone)]
pub struct DidWebFetcher {
    client: reqwest::Client,
    scheme: &'static str,
}

impl DidWebFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nzcp-verifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            scheme: "https",
        })
    }

    /// Resolve over plain HTTP. Only for local test servers.
    pub fn with_insecure_http(mut self) -> Self {
        self.scheme = "http";
        self
    }

    /// The URL the document for `issuer` is published at.
    pub fn document_url(&self, issuer: &str) -> Result<Url, FetchError> {
        did_web_url(issuer, self.scheme)
    }
}

#[async_trait]
impl KeyDocumentFetcher for DidWebFetcher {
    async fn fetch(&self, issuer: &str) -> Result<DidDocument, FetchError> {
        let url = self.document_url(issuer)?;
        let url_str = url.to_string();
        tracing::debug!(issuer, url = %url_str, "fetching issuer document");

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/did+json, application/json")
            .send()
            .await
            .map_err(|e| transport_error(&url_str, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| transport_error(&url_str, e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::InvalidDocument {
            url: url_str,
            reason: e.to_string(),
        })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

fn did_web_url(issuer: &str, scheme: &str) -> Result<Url, FetchError> {
    let unsupported = || FetchError::UnsupportedIssuer(issuer.to_string());

    let rest = issuer.strip_prefix(DID_WEB_PREFIX).ok_or_else(unsupported)?;
    let mut segments = rest.split(':');
    let host = segments
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(unsupported)?
        .replace("%3A", ":")
        .replace("%3a", ":");
    let path: Vec<&str> = segments.collect();
    if path.iter().any(|s| s.is_empty()) {
        return Err(unsupported());
    }

    let location = if path.is_empty() {
        format!("{scheme}://{host}/.well-known/did.json")
    } else {
        format!("{scheme}://{host}/{}/did.json", path.join("/"))
    };
    Url::parse(&location).map_err(|_| unsupported())
}

/// A fetcher with no network. Every lookup fails as unreachable, so
/// verification is limited to cached issuers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl KeyDocumentFetcher for OfflineFetcher {
    async fn fetch(&self, issuer: &str) -> Result<DidDocument, FetchError> {
        Err(FetchError::Network {
            url: issuer.to_string(),
            reason: "offline".to_string(),
        })
    }
}
