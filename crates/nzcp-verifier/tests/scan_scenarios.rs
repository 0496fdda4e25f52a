//! # End-to-End Scan Scenarios
//!
//! Drives `Verifier::verify_payload` with passes minted from freshly
//! generated P-256 keys, an in-memory issuer store, and a fixed clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ciborium::value::Value;
use parking_lot::Mutex;

use nzcp_core::{Clock, FixedClock, InvalidReason, Verification, VerificationResult, VerifierConfig};
use nzcp_crypto::test_support::{encode, TestIssuer};
use nzcp_issuer::{
    DidDocument, FetchError, InMemoryIssuerStore, IssuerCache, IssuerResolver, IssuerStore,
    KeyDocumentFetcher,
};
use nzcp_verifier::{
    payload, AnalyticsError, AnalyticsEvent, AnalyticsSink, CancellationToken, ResultSink,
    Verifier,
};

const ISSUER: &str = "did:web:nzcp.test.example";
/// 2023-11-14T22:13:20Z
const NOW_SECS: i64 = 1_700_000_000;
const DAY_SECS: i64 = 86_400;

// ── Fixtures ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct StaticFetcher {
    documents: HashMap<String, DidDocument>,
    calls: AtomicUsize,
    hang: bool,
    cancel_on_fetch: Option<CancellationToken>,
}

#[async_trait]
impl KeyDocumentFetcher for StaticFetcher {
    async fn fetch(&self, issuer: &str) -> Result<DidDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.documents
            .get(issuer)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: issuer.to_string(),
                status: 404,
            })
    }
}

#[derive(Default)]
struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

#[async_trait]
impl AnalyticsSink for RecordingAnalytics {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingResults {
    published: Mutex<Vec<Verification>>,
}

impl ResultSink for RecordingResults {
    fn publish(&self, verification: &Verification) {
        self.published.lock().push(verification.clone());
    }
}

struct Harness {
    verifier: Verifier,
    signer: TestIssuer,
    fetcher: Arc<StaticFetcher>,
    store: Arc<InMemoryIssuerStore>,
    analytics: Arc<RecordingAnalytics>,
    results: Arc<RecordingResults>,
    clock: Arc<FixedClock>,
}

fn harness_with(configure: impl FnOnce(&mut StaticFetcher), analytics_enabled: bool) -> Harness {
    let signer = TestIssuer::generate("key-1");
    let mut fetcher = StaticFetcher::default();
    fetcher.documents.insert(
        ISSUER.to_string(),
        DidDocument::with_assertion_key(ISSUER, signer.kid(), signer.jwk()),
    );
    configure(&mut fetcher);
    let fetcher = Arc::new(fetcher);

    let config = VerifierConfig::new([ISSUER])
        .with_request_timeout(Duration::from_millis(200))
        .with_analytics(analytics_enabled);
    let store = Arc::new(InMemoryIssuerStore::new());
    let clock = Arc::new(FixedClock::from_millis(NOW_SECS * 1000));
    let cache = IssuerCache::new(store.clone(), clock.clone(), config.issuer_cache_max_age);
    let resolver = IssuerResolver::new(&config, cache, fetcher.clone());

    let analytics = Arc::new(RecordingAnalytics::default());
    let results = Arc::new(RecordingResults::default());
    let verifier = Verifier::new(&config, resolver)
        .with_analytics(analytics.clone())
        .with_result_sink(results.clone());

    Harness {
        verifier,
        signer,
        fetcher,
        store,
        analytics,
        results,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(|_| {}, true)
}

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

fn int(i: i64) -> Value {
    Value::Integer(i.into())
}

fn subject() -> Value {
    Value::Map(vec![(
        text("credentialSubject"),
        Value::Map(vec![
            (text("givenName"), text("Jack")),
            (text("familyName"), text("Sparrow")),
            (text("dob"), text("1960-04-16")),
        ]),
    )])
}

fn claims(iss: &str, exp: Option<i64>, nbf: Option<i64>) -> Value {
    let mut map = vec![(int(1), text(iss))];
    if let Some(exp) = exp {
        map.push((int(4), int(exp)));
    }
    if let Some(nbf) = nbf {
        map.push((int(5), int(nbf)));
    }
    map.push((int(7), Value::Bytes(vec![0x60, 0xa4, 0xf5, 0x4d])));
    map.push((text("vc"), subject()));
    Value::Map(map)
}

fn mint(signer: &TestIssuer, claims: &Value) -> String {
    let cwt = encode(claims).unwrap();
    payload::encode(&signer.sign(&cwt).unwrap())
}

fn valid_claims() -> Value {
    claims(ISSUER, Some(NOW_SECS + 30 * DAY_SECS), Some(NOW_SECS - 30 * DAY_SECS))
}

/// Let spawned analytics tasks run on the current-thread runtime.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_pass() {
    let h = harness();
    let raw = mint(&h.signer, &valid_claims());

    let v = h.verifier.verify_payload(&raw).await;
    let VerificationResult::Valid {
        given_name,
        family_name,
        dob,
        expiry,
    } = v.result
    else {
        panic!("expected Valid, got {:?}", v.result);
    };
    assert_eq!(given_name, "Jack");
    assert_eq!(family_name.as_deref(), Some("Sparrow"));
    assert_eq!(dob.to_string(), "16/04/1960");
    assert_eq!(expiry.to_string(), "14/12/2023");
}

#[tokio::test]
async fn garbage_cannot_be_read() {
    let h = harness();
    let v = h.verifier.verify_payload("garbage").await;
    assert_eq!(v.result, VerificationResult::CannotRead);
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn issuer_timeout_cannot_be_validated() {
    let h = harness_with(|f| f.hang = true, false);
    let raw = mint(&h.signer, &valid_claims());
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(v.result, VerificationResult::CannotValidate);
}

#[tokio::test]
async fn unreachable_issuer_cannot_be_validated() {
    let h = harness_with(|f| f.documents.clear(), false);
    let raw = mint(&h.signer, &valid_claims());
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(v.result, VerificationResult::CannotValidate);
}

#[tokio::test]
async fn pass_expired_one_day_ago() {
    let h = harness();
    let raw = mint(
        &h.signer,
        &claims(ISSUER, Some(NOW_SECS - DAY_SECS), Some(NOW_SECS - 30 * DAY_SECS)),
    );

    let v = h.verifier.verify_payload(&raw).await;
    let VerificationResult::Invalid {
        reason,
        expiry,
        expired_duration_days,
    } = v.result
    else {
        panic!("expected Invalid, got {:?}", v.result);
    };
    assert_eq!(reason, InvalidReason::CredentialExpired);
    assert_eq!(expiry.unwrap().to_string(), "13/11/2023");
    assert!((expired_duration_days.unwrap() - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn missing_exp_is_expired() {
    let h = harness();
    let raw = mint(&h.signer, &claims(ISSUER, None, None));
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(
        v.result,
        VerificationResult::invalid(InvalidReason::CredentialExpired)
    );
}

#[tokio::test]
async fn not_yet_active_pass() {
    let h = harness();
    let raw = mint(
        &h.signer,
        &claims(ISSUER, Some(NOW_SECS + 30 * DAY_SECS), Some(NOW_SECS + DAY_SECS)),
    );
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(
        v.result,
        VerificationResult::invalid(InvalidReason::CredentialNotActive)
    );
}

#[tokio::test]
async fn untrusted_issuer_is_rejected_without_fetching() {
    let h = harness();
    let raw = mint(
        &h.signer,
        &claims("did:web:evil.example", Some(NOW_SECS + DAY_SECS), None),
    );
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(
        v.result,
        VerificationResult::invalid(InvalidReason::IssuerNotTrusted)
    );
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pass_signed_by_another_key_is_rejected() {
    let h = harness();
    let impostor = TestIssuer::generate("key-1");
    let raw = mint(&impostor, &valid_claims());
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(
        v.result,
        VerificationResult::invalid(InvalidReason::SignatureInvalid)
    );
}

#[tokio::test]
async fn unpublished_kid_is_an_invalid_issuer_key() {
    let h = harness();
    let rotated = TestIssuer::generate("key-9");
    let raw = mint(&rotated, &valid_claims());
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(
        v.result,
        VerificationResult::invalid(InvalidReason::IssuerPublicKeyInvalid)
    );
}

#[tokio::test]
async fn unsupported_algorithm_cannot_be_read() {
    let h = harness();
    let cwt = encode(&valid_claims()).unwrap();
    let raw = payload::encode(&h.signer.sign_with_alg(-35, &cwt).unwrap());
    let v = h.verifier.verify_payload(&raw).await;
    assert_eq!(v.result, VerificationResult::CannotRead);
}

#[tokio::test]
async fn malformed_subject_cannot_be_read() {
    let h = harness();
    let bad = Value::Map(vec![
        (int(1), text(ISSUER)),
        (int(4), int(NOW_SECS + DAY_SECS)),
        (
            text("vc"),
            Value::Map(vec![(
                text("credentialSubject"),
                Value::Map(vec![(text("givenName"), text("Jack"))]),
            )]),
        ),
    ]);
    let v = h.verifier.verify_payload(&mint(&h.signer, &bad)).await;
    assert_eq!(v.result, VerificationResult::CannotRead);
}

#[tokio::test]
async fn repeated_scans_are_deterministic_and_hit_the_cache() {
    let h = harness();
    let raw = mint(&h.signer, &valid_claims());
    let first = h.verifier.verify_payload(&raw).await;
    let second = h.verifier.verify_payload(&raw).await;
    assert_eq!(first.result, second.result);
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_cache_entry_is_refetched() {
    let h = harness();
    let raw = mint(&h.signer, &claims(ISSUER, Some(NOW_SECS + 60 * DAY_SECS), None));
    h.verifier.verify_payload(&raw).await;
    h.clock.advance(chrono::Duration::days(15));
    let v = h.verifier.verify_payload(&raw).await;
    assert!(v.result.is_valid());
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 2);
}

// ── Publication and analytics ────────────────────────────────────────────

#[tokio::test]
async fn every_completed_scan_is_published_and_recorded_once() {
    let h = harness();
    let raw = mint(&h.signer, &valid_claims());
    h.verifier.verify_payload(&raw).await;
    h.verifier.verify_payload("garbage").await;
    settle().await;

    assert_eq!(h.results.published.lock().len(), 2);
    let events = h.analytics.events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name, "scanValid");
    assert_eq!(events[1].name, "scanInvalid");
    assert_eq!(events[1].attributes["reason"], "CannotRead");
    assert!(events[1].metrics.contains_key("processedInMs"));
}

#[tokio::test]
async fn analytics_disabled_records_nothing() {
    let h = harness_with(|_| {}, false);
    h.verifier.verify_payload("garbage").await;
    settle().await;
    assert!(h.analytics.events.lock().is_empty());
    assert_eq!(h.results.published.lock().len(), 1);
}

#[tokio::test]
async fn cancelled_scan_publishes_nothing_but_keeps_cache_write() {
    let token = CancellationToken::new();
    let cancel = token.clone();
    let h = harness_with(move |f| f.cancel_on_fetch = Some(cancel), true);
    let raw = mint(&h.signer, &valid_claims());

    let outcome = h.verifier.verify_payload_with_cancel(&raw, &token).await;
    settle().await;

    assert!(outcome.is_none());
    assert!(h.results.published.lock().is_empty());
    assert!(h.analytics.events.lock().is_empty());
    assert!(h.store.get_cached_item(ISSUER).is_some());
}

#[tokio::test]
async fn uncancelled_scan_completes_normally() {
    let h = harness();
    let raw = mint(&h.signer, &valid_claims());
    let outcome = h
        .verifier
        .verify_payload_with_cancel(&raw, &CancellationToken::new())
        .await
        .expect("not cancelled");
    assert!(outcome.result.is_valid());
    assert_eq!(h.clock.now().timestamp(), NOW_SECS);
}
