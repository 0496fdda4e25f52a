//! # Cryptographic Error Types
//!
//! Structured errors for COSE decoding and ES256 verification.

use thiserror::Error;

/// Errors from cryptographic operations in `nzcp-crypto`.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The bytes are not well-formed CBOR.
    #[error("CBOR decode error: {0}")]
    CborDecode(String),

    /// CBOR encoding failed while building a structure to verify.
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// The CBOR is valid but is not a COSE_Sign1 structure.
    #[error("malformed COSE_Sign1: {0}")]
    MalformedSign1(String),

    /// The protected header names an algorithm other than ES256.
    #[error("unsupported COSE algorithm: {0:?}")]
    UnsupportedAlgorithm(Option<i64>),

    /// Invalid EC public key material.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid signature encoding (ES256 signatures are 64 bytes, r || s).
    #[error("invalid ES256 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Signature does not verify under the given key.
    #[error("ES256 verification failed")]
    VerificationFailed,
}
