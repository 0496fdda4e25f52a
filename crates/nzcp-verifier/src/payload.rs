//! # Payload Codec
//!
//! An NZCP QR code carries `NZCP:/1/<base32>`: the prefix `NZCP:`, the
//! version `1`, and the RFC 4648 base-32 encoding of a COSE_Sign1 message,
//! separated by `/`.
//!
//! Decoding is strict. Any other prefix or version is rejected; there is no
//! forward compatibility. Every error here is reported to the user as
//! `CannotRead`.

use data_encoding::BASE32_NOPAD;

pub const NZCP_PREFIX: &str = "NZCP:";
pub const NZCP_VERSION: &str = "1";

/// A validated NZCP envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEnvelope {
    pub prefix: String,
    pub version: String,
    /// The decoded COSE_Sign1 bytes.
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("expected 3 non-empty '/'-separated segments, got {0:?}")]
    Segments(usize),
    #[error("unexpected prefix {0:?}")]
    Prefix(String),
    #[error("unsupported version {0:?}")]
    Version(String),
    #[error("invalid base32 body: {0}")]
    Base32(String),
}

/// Split and decode a scanned payload.
pub fn decode(raw: &str) -> Result<DecodedEnvelope, PayloadError> {
    let segments: Vec<&str> = raw.split('/').collect();
    let [prefix, version, body] = segments.as_slice() else {
        return Err(PayloadError::Segments(segments.len()));
    };
    if prefix.is_empty() || version.is_empty() || body.is_empty() {
        return Err(PayloadError::Segments(
            segments.iter().filter(|s| !s.is_empty()).count(),
        ));
    }
    if *prefix != NZCP_PREFIX {
        return Err(PayloadError::Prefix(prefix.to_string()));
    }
    if *version != NZCP_VERSION {
        return Err(PayloadError::Version(version.to_string()));
    }

    let bytes = BASE32_NOPAD
        .decode(body.trim_end_matches('=').as_bytes())
        .map_err(|e| PayloadError::Base32(e.to_string()))?;

    Ok(DecodedEnvelope {
        prefix: prefix.to_string(),
        version: version.to_string(),
        bytes,
    })
}

/// Build a payload string from COSE_Sign1 bytes.
pub fn encode(bytes: &[u8]) -> String {
    format!("{NZCP_PREFIX}/{NZCP_VERSION}/{}", BASE32_NOPAD.encode(bytes))
}
