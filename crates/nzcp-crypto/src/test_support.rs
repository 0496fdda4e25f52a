//! Issuer-side signing helpers.
//!
//! Produces ES256 COSE_Sign1 messages the way an NZCP issuer does, so tests
//! and tooling can mint credentials against freshly generated keys. Enabled
//! with the `test-support` feature.

use ciborium::value::Value;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::OsRng;

use crate::cose::{sig_structure, ALG_ES256, COSE_SIGN1_TAG};
use crate::error::CryptoError;
use crate::jwk::Jwk;

/// A P-256 signing key with the key id it is published under.
pub struct TestIssuer {
    signing_key: SigningKey,
    kid: String,
}

impl TestIssuer {
    /// Generate a fresh key pair using the OS CSPRNG.
    pub fn generate(kid: impl Into<String>) -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
            kid: kid.into(),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public key as a JWK for a DID document.
    pub fn jwk(&self) -> Jwk {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        match (point.x(), point.y()) {
            (Some(x), Some(y)) => Jwk::ec_p256(x, y),
            // Uncompressed points always carry both coordinates.
            _ => Jwk::ec_p256(&[], &[]),
        }
    }

    /// Sign `payload` (CWT claims bytes) as a tagged ES256 COSE_Sign1.
    pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.sign_with_alg(ALG_ES256, payload)
    }

    /// Sign with an arbitrary `alg` header value. The signature itself is
    /// always ES256; only the declared algorithm changes.
    pub fn sign_with_alg(&self, alg: i64, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let protected = encode(&Value::Map(vec![
            (
                Value::Integer(4.into()),
                Value::Bytes(self.kid.as_bytes().to_vec()),
            ),
            (Value::Integer(1.into()), Value::Integer(alg.into())),
        ]))?;
        let to_sign = sig_structure(&protected, payload)?;
        let signature: Signature = self.signing_key.sign(&to_sign);

        encode(&Value::Tag(
            COSE_SIGN1_TAG,
            Box::new(Value::Array(vec![
                Value::Bytes(protected),
                Value::Map(vec![]),
                Value::Bytes(payload.to_vec()),
                Value::Bytes(signature.to_bytes().to_vec()),
            ])),
        ))
    }
}

/// CBOR-encode a value.
pub fn encode(value: &Value) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).map_err(|e| CryptoError::CborEncode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cose::CoseSign1;

    #[test]
    fn minted_message_verifies_under_published_jwk() {
        let issuer = TestIssuer::generate("key-1");
        let bytes = issuer.sign(b"claims").unwrap();
        let msg = CoseSign1::from_slice(&bytes).unwrap();
        assert_eq!(msg.kid_str(), Some("key-1"));
        let key = issuer.jwk().to_es256_key().unwrap();
        key.verify(&msg.signing_input().unwrap(), &msg.signature)
            .unwrap();
    }
}
