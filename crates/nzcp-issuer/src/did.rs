//! # Issuer DID Documents
//!
//! NZCP issuers are identified by `did:web` DIDs. The DID document published
//! for an issuer lists its public keys under `verificationMethod` and names
//! the ones allowed to sign credentials under `assertionMethod`.
//!
//! A credential signed with key id `kid` by issuer `iss` is verified with the
//! method whose id is `iss#kid`, and only if that id is referenced from
//! `assertionMethod`.

use serde::{Deserialize, Serialize};

use nzcp_crypto::{Es256VerifyingKey, Jwk};

use crate::error::DocumentError;

/// A DID document, reduced to the members key resolution needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    pub id: String,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub assertion_method: Vec<MethodReference>,
}

/// A public key entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

/// An `assertionMethod` entry: a reference to a verification method, or an
/// embedded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodReference {
    Reference(String),
    Embedded(VerificationMethod),
}

impl MethodReference {
    fn id(&self) -> &str {
        match self {
            Self::Reference(id) => id,
            Self::Embedded(method) => &method.id,
        }
    }
}

impl DidDocument {
    /// A minimal document publishing a single JWK assertion key.
    pub fn with_assertion_key(issuer: &str, kid: &str, jwk: Jwk) -> Self {
        let key_id = format!("{issuer}#{kid}");
        Self {
            context: Some(serde_json::json!([
                "https://w3.org/ns/did/v1",
                "https://w3id.org/security/suites/jws-2020/v1"
            ])),
            id: issuer.to_string(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                controller: Some(issuer.to_string()),
                method_type: "JsonWebKey2020".to_string(),
                public_key_jwk: Some(jwk),
            }],
            assertion_method: vec![MethodReference::Reference(key_id)],
        }
    }

    /// Check the document belongs to `issuer`.
    pub fn ensure_issuer(&self, issuer: &str) -> Result<(), DocumentError> {
        if self.id == issuer {
            Ok(())
        } else {
            Err(DocumentError::IdMismatch {
                expected: issuer.to_string(),
                found: self.id.clone(),
            })
        }
    }

    /// Select the assertion key `issuer#kid` and convert it to an ES256 key.
    pub fn assertion_key(&self, issuer: &str, kid: &str) -> Result<Es256VerifyingKey, DocumentError> {
        self.ensure_issuer(issuer)?;
        let key_id = format!("{issuer}#{kid}");

        let authorized = self
            .assertion_method
            .iter()
            .find(|m| self.absolute(m.id()) == key_id)
            .ok_or_else(|| DocumentError::KeyNotAuthorized(key_id.clone()))?;

        let method = match authorized {
            MethodReference::Embedded(method) => method,
            MethodReference::Reference(_) => self
                .verification_method
                .iter()
                .find(|m| self.absolute(&m.id) == key_id)
                .ok_or_else(|| DocumentError::KeyNotFound(key_id.clone()))?,
        };

        let jwk = method
            .public_key_jwk
            .as_ref()
            .ok_or_else(|| DocumentError::MissingJwk(key_id.clone()))?;
        jwk.to_es256_key().map_err(|source| DocumentError::InvalidKey {
            id: key_id,
            source,
        })
    }

    /// Expand a relative DID URL (`#key-1`) against this document's id.
    fn absolute(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{id}", self.id)
        } else {
            id.to_string()
        }
    }
}
