//! # Credential Verification
//!
//! Verifies the COSE_Sign1-wrapped CWT inside a decoded envelope:
//!
//! 1. Decode COSE_Sign1, require ES256, read `kid`, decode the CWT claims
//!    and read `iss`.
//! 2. Resolve the issuer's DID document and select the `iss#kid` assertion
//!    key.
//! 3. Verify the signature over the `Sig_structure`.
//! 4. Check `exp` (required) and `nbf` (optional) against the clock.
//! 5. Extract `vc.credentialSubject`.
//!
//! The first failing step determines the [`VerifyFailure`].

use chrono::{DateTime, NaiveDate, Utc};
use ciborium::value::Value;

use nzcp_core::Clock;
use nzcp_crypto::{CoseSign1, CryptoError};
use nzcp_issuer::{DocumentError, IssuerResolver, ResolveError};

use crate::payload::DecodedEnvelope;

const CLAIM_ISS: i64 = 1;
const CLAIM_EXP: i64 = 4;
const CLAIM_NBF: i64 = 5;
const CLAIM_VC: &str = "vc";

/// Claims of a credential that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub issuer: String,
    pub kid: String,
    pub expiry: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
    pub given_name: String,
    pub family_name: Option<String>,
    pub dob: NaiveDate,
}

/// Why a credential failed verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyFailure {
    /// Structurally unusable: bad CBOR, bad COSE, missing or mistyped claims.
    #[error("payload invalid: {0}")]
    PayloadInvalid(String),
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(Option<i64>),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The issuer document does not publish a usable key for `kid`.
    #[error("issuer public key invalid: {0}")]
    IssuerKey(#[from] DocumentError),
    #[error("signature invalid")]
    SignatureInvalid,
    /// `exp` is in the past, or absent.
    #[error("credential expired")]
    Expired { expiry: Option<DateTime<Utc>> },
    #[error("credential not active until {not_before}")]
    NotActive { not_before: DateTime<Utc> },
}

impl From<CryptoError> for VerifyFailure {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::UnsupportedAlgorithm(alg) => Self::UnsupportedAlgorithm(alg),
            CryptoError::InvalidSignatureLength(_) | CryptoError::VerificationFailed => {
                Self::SignatureInvalid
            }
            other => Self::PayloadInvalid(other.to_string()),
        }
    }
}

/// The CWT claims this verifier reads.
#[derive(Debug)]
struct CwtClaims {
    iss: String,
    exp: Option<DateTime<Utc>>,
    nbf: Option<DateTime<Utc>>,
    vc: Option<Value>,
}

/// Verify the credential in `envelope`, resolving its issuer via `resolver`.
pub async fn verify(
    envelope: &DecodedEnvelope,
    resolver: &IssuerResolver,
    clock: &dyn Clock,
) -> Result<VerifiedClaims, VerifyFailure> {
    let message = CoseSign1::from_slice(&envelope.bytes)?;
    message.require_es256()?;
    let kid = match (&message.kid, message.kid_str()) {
        (None, _) => return Err(invalid("missing kid")),
        (Some(_), None) => return Err(invalid("kid is not UTF-8")),
        (Some(_), Some(kid)) => kid.to_string(),
    };
    let claims = parse_claims(&message.payload)?;

    let document = resolver.resolve(&claims.iss).await?;
    let key = document.assertion_key(&claims.iss, &kid)?;
    key.verify(&message.signing_input()?, &message.signature)
        .map_err(|_| VerifyFailure::SignatureInvalid)?;

    let now = clock.now();
    let expiry = claims
        .exp
        .ok_or(VerifyFailure::Expired { expiry: None })?;
    if now > expiry {
        return Err(VerifyFailure::Expired {
            expiry: Some(expiry),
        });
    }
    if let Some(not_before) = claims.nbf {
        if now < not_before {
            return Err(VerifyFailure::NotActive { not_before });
        }
    }

    let subject = credential_subject(claims.vc.as_ref())?;
    Ok(VerifiedClaims {
        issuer: claims.iss,
        kid,
        expiry,
        not_before: claims.nbf,
        given_name: subject.given_name,
        family_name: subject.family_name,
        dob: subject.dob,
    })
}

fn invalid(reason: impl Into<String>) -> VerifyFailure {
    VerifyFailure::PayloadInvalid(reason.into())
}

fn parse_claims(payload: &[u8]) -> Result<CwtClaims, VerifyFailure> {
    let value: Value = ciborium::de::from_reader(payload)
        .map_err(|e| invalid(format!("CWT claims are not CBOR: {e}")))?;
    let Value::Map(map) = value else {
        return Err(invalid("CWT claims are not a map"));
    };

    let iss = match lookup(&map, &Value::Integer(CLAIM_ISS.into())) {
        Some(Value::Text(iss)) => iss.clone(),
        Some(_) => return Err(invalid("iss is not text")),
        None => return Err(invalid("missing iss")),
    };
    let exp = lookup(&map, &Value::Integer(CLAIM_EXP.into()))
        .map(|v| timestamp(v, "exp"))
        .transpose()?;
    let nbf = lookup(&map, &Value::Integer(CLAIM_NBF.into()))
        .map(|v| timestamp(v, "nbf"))
        .transpose()?;
    let vc = lookup(&map, &Value::Text(CLAIM_VC.into())).cloned();

    Ok(CwtClaims { iss, exp, nbf, vc })
}

fn lookup<'a>(map: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
    map.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// NumericDate (seconds since epoch) to an instant.
fn timestamp(value: &Value, claim: &str) -> Result<DateTime<Utc>, VerifyFailure> {
    let secs = match value {
        Value::Integer(i) => i64::try_from(*i).ok(),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    };
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or_else(|| invalid(format!("{claim} is not a valid NumericDate")))
}

struct Subject {
    given_name: String,
    family_name: Option<String>,
    dob: NaiveDate,
}

fn credential_subject(vc: Option<&Value>) -> Result<Subject, VerifyFailure> {
    let Some(Value::Map(vc)) = vc else {
        return Err(invalid("missing vc claim"));
    };
    let Some(Value::Map(subject)) = lookup(vc, &Value::Text("credentialSubject".into())) else {
        return Err(invalid("missing credentialSubject"));
    };

    let given_name = match lookup(subject, &Value::Text("givenName".into())) {
        Some(Value::Text(name)) => name.clone(),
        _ => return Err(invalid("givenName missing or not text")),
    };
    let family_name = match lookup(subject, &Value::Text("familyName".into())) {
        None | Some(Value::Null) => None,
        Some(Value::Text(name)) => Some(name.clone()),
        Some(_) => return Err(invalid("familyName is not text")),
    };
    let dob = match lookup(subject, &Value::Text("dob".into())) {
        Some(Value::Text(dob)) => NaiveDate::parse_from_str(dob, "%Y-%m-%d")
            .map_err(|_| invalid("dob is not YYYY-MM-DD"))?,
        _ => return Err(invalid("dob missing or not text")),
    };

    Ok(Subject {
        given_name,
        family_name,
        dob,
    })
}
