//! JSON Web Key (RFC 7517) public keys, as published in the
//! `verificationMethod` entries of an issuer DID document.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::es256::Es256VerifyingKey;

/// A public JWK. Only EC P-256 keys are usable for verification; other key
/// types deserialize but fail conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Build an EC P-256 JWK from raw 32-byte affine coordinates.
    pub fn ec_p256(x: &[u8], y: &[u8]) -> Self {
        Self {
            kty: "EC".to_string(),
            crv: Some("P-256".to_string()),
            x: Some(URL_SAFE_NO_PAD.encode(x)),
            y: Some(URL_SAFE_NO_PAD.encode(y)),
        }
    }

    /// Convert to an ES256 verifying key.
    pub fn to_es256_key(&self) -> Result<Es256VerifyingKey, CryptoError> {
        if self.kty != "EC" {
            return Err(CryptoError::InvalidPublicKey(format!(
                "expected kty EC, got {}",
                self.kty
            )));
        }
        if self.crv.as_deref() != Some("P-256") {
            return Err(CryptoError::InvalidPublicKey(format!(
                "expected crv P-256, got {:?}",
                self.crv
            )));
        }
        let x = decode_coordinate(self.x.as_deref(), "x")?;
        let y = decode_coordinate(self.y.as_deref(), "y")?;
        Es256VerifyingKey::from_affine(&x, &y)
    }
}

fn decode_coordinate(value: Option<&str>, name: &str) -> Result<Vec<u8>, CryptoError> {
    let value =
        value.ok_or_else(|| CryptoError::InvalidPublicKey(format!("missing {name} coordinate")))?;
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|e| CryptoError::InvalidPublicKey(format!("{name} is not base64url: {e}")))
}
