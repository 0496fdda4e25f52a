//! # ES256 Verification
//!
//! ECDSA over NIST P-256 with SHA-256 (COSE algorithm -7). Signatures are
//! the fixed-width 64-byte `r || s` encoding used by COSE, not DER.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::{EncodedPoint, FieldBytes};

use crate::error::CryptoError;

const COORDINATE_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// A P-256 public key used to verify ES256 signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Es256VerifyingKey {
    inner: VerifyingKey,
}

impl Es256VerifyingKey {
    /// Build from 32-byte big-endian affine coordinates.
    pub fn from_affine(x: &[u8], y: &[u8]) -> Result<Self, CryptoError> {
        if x.len() != COORDINATE_LEN || y.len() != COORDINATE_LEN {
            return Err(CryptoError::InvalidPublicKey(format!(
                "coordinates must be {COORDINATE_LEN} bytes, got x={} y={}",
                x.len(),
                y.len()
            )));
        }
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(x),
            FieldBytes::from_slice(y),
            false,
        );
        let inner = VerifyingKey::from_encoded_point(&point)
            .map_err(|_| CryptoError::InvalidPublicKey("point is not on P-256".into()))?;
        Ok(Self { inner })
    }

    /// Verify a raw `r || s` signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        if signature.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignatureLength(signature.len()));
        }
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::VerificationFailed)?;
        self.inner
            .verify(message, &signature)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl From<VerifyingKey> for Es256VerifyingKey {
    fn from(inner: VerifyingKey) -> Self {
        Self { inner }
    }
}
