//! # COSE_Sign1 (RFC 8152 §4.2)
//!
//! An NZCP credential is a CWT wrapped in a COSE_Sign1 structure:
//!
//! ```text
//! COSE_Sign1 = #6.18([ protected: bstr, unprotected: map, payload: bstr, signature: bstr ])
//! ```
//!
//! The protected header is itself a CBOR-encoded map carrying `alg` (label 1)
//! and `kid` (label 4). The bytes actually signed are the CBOR encoding of
//!
//! ```text
//! Sig_structure = [ "Signature1", protected, external_aad: h'', payload ]
//! ```

use ciborium::value::{Integer, Value};

use crate::error::CryptoError;

/// CBOR tag for COSE_Sign1.
pub const COSE_SIGN1_TAG: u64 = 18;

/// COSE algorithm identifier for ECDSA P-256 with SHA-256.
pub const ALG_ES256: i64 = -7;

const HEADER_ALG: i64 = 1;
const HEADER_KID: i64 = 4;

/// A decoded COSE_Sign1 message.
#[derive(Debug, Clone, PartialEq)]
pub struct CoseSign1 {
    /// Protected header bytes exactly as received.
    pub protected: Vec<u8>,
    /// `alg` from the protected header.
    pub alg: Option<i64>,
    /// `kid` from the protected header, falling back to the unprotected one.
    pub kid: Option<Vec<u8>>,
    /// The CWT claims bytes.
    pub payload: Vec<u8>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

impl CoseSign1 {
    /// Decode a (tagged or untagged) COSE_Sign1 message.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| CryptoError::CborDecode(e.to_string()))?;

        let value = match value {
            Value::Tag(COSE_SIGN1_TAG, inner) => *inner,
            Value::Tag(other, _) => {
                return Err(CryptoError::MalformedSign1(format!(
                    "unexpected CBOR tag {other}"
                )))
            }
            untagged => untagged,
        };

        let Value::Array(items) = value else {
            return Err(CryptoError::MalformedSign1("expected an array".into()));
        };
        let [protected, unprotected, payload, signature]: [Value; 4] =
            items.try_into().map_err(|items: Vec<Value>| {
                CryptoError::MalformedSign1(format!("expected 4 elements, got {}", items.len()))
            })?;

        let protected = into_bytes(protected, "protected header")?;
        let payload = into_bytes(payload, "payload")?;
        let signature = into_bytes(signature, "signature")?;

        let protected_map = if protected.is_empty() {
            Vec::new()
        } else {
            match ciborium::de::from_reader::<Value, _>(protected.as_slice())
                .map_err(|e| CryptoError::CborDecode(e.to_string()))?
            {
                Value::Map(entries) => entries,
                _ => {
                    return Err(CryptoError::MalformedSign1(
                        "protected header is not a map".into(),
                    ))
                }
            }
        };
        let unprotected_map = match unprotected {
            Value::Map(entries) => entries,
            _ => {
                return Err(CryptoError::MalformedSign1(
                    "unprotected header is not a map".into(),
                ))
            }
        };

        let alg = match header_value(&protected_map, HEADER_ALG) {
            None => None,
            Some(Value::Integer(i)) => Some(
                i64::try_from(*i)
                    .map_err(|_| CryptoError::MalformedSign1("alg out of range".into()))?,
            ),
            Some(_) => return Err(CryptoError::MalformedSign1("alg is not an integer".into())),
        };

        let kid = match header_value(&protected_map, HEADER_KID)
            .or_else(|| header_value(&unprotected_map, HEADER_KID))
        {
            None => None,
            Some(Value::Bytes(b)) => Some(b.clone()),
            Some(_) => return Err(CryptoError::MalformedSign1("kid is not a byte string".into())),
        };

        Ok(Self {
            protected,
            alg,
            kid,
            payload,
            signature,
        })
    }

    /// Fail unless the protected header declares ES256.
    pub fn require_es256(&self) -> Result<(), CryptoError> {
        match self.alg {
            Some(ALG_ES256) => Ok(()),
            other => Err(CryptoError::UnsupportedAlgorithm(other)),
        }
    }

    /// The key identifier as text, if present and valid UTF-8.
    pub fn kid_str(&self) -> Option<&str> {
        self.kid.as_deref().and_then(|k| std::str::from_utf8(k).ok())
    }

    /// CBOR encoding of the `Sig_structure` covered by the signature.
    pub fn signing_input(&self) -> Result<Vec<u8>, CryptoError> {
        sig_structure(&self.protected, &self.payload)
    }
}

/// Build the CBOR-encoded `Sig_structure` for a COSE_Sign1 with empty
/// external AAD.
pub fn sig_structure(protected: &[u8], payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let structure = Value::Array(vec![
        Value::Text("Signature1".to_string()),
        Value::Bytes(protected.to_vec()),
        Value::Bytes(Vec::new()),
        Value::Bytes(payload.to_vec()),
    ]);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&structure, &mut out)
        .map_err(|e| CryptoError::CborEncode(e.to_string()))?;
    Ok(out)
}

fn into_bytes(value: Value, what: &str) -> Result<Vec<u8>, CryptoError> {
    match value {
        Value::Bytes(b) => Ok(b),
        _ => Err(CryptoError::MalformedSign1(format!("{what} is not a byte string"))),
    }
}

fn header_value(map: &[(Value, Value)], label: i64) -> Option<&Value> {
    let label = Integer::from(label);
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if *i == label))
        .map(|(_, v)| v)
}
