//! # nzcp-crypto — Cryptographic Primitives for the NZCP Verifier
//!
//! - **COSE_Sign1** ([`CoseSign1`]): decodes the signed envelope carried
//!   inside an NZCP payload and rebuilds the `Sig_structure` the issuer
//!   signed.
//! - **ES256** ([`Es256VerifyingKey`]): ECDSA over P-256 with SHA-256,
//!   the only algorithm NZCP permits.
//! - **JWK** ([`Jwk`]): the public key representation published in issuer
//!   DID documents.
//!
//! ## Security Invariants
//!
//! - Signatures are verified over the exact protected-header bytes received,
//!   never a re-encoding of the decoded header.
//! - Any algorithm other than ES256 is rejected before key resolution.

pub mod cose;
pub mod error;
pub mod es256;
pub mod jwk;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use cose::{CoseSign1, ALG_ES256, COSE_SIGN1_TAG};
pub use error::CryptoError;
pub use es256::Es256VerifyingKey;
pub use jwk::Jwk;
