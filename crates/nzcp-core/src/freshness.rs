//! Issuer cache freshness.
//!
//! Classifies how close the issuer cache is to expiring, based on the most
//! recent cache update. Offline verification only works while cached issuer
//! keys are within their max age, so hosts surface this to the operator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Freshness of the issuer cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CacheStatus {
    /// At least 13 days remain before the cache becomes invalid.
    UpToDate,
    /// Between 7 and 13 days remain.
    RecentlyUpdated { last_update: DateTime<Utc> },
    /// Between 1 and 7 days remain.
    NeedsUpdateSoon { invalid_at: DateTime<Utc> },
    /// Less than a day remains, or the cache was never populated.
    NeedsImmediateUpdate { invalid_at: DateTime<Utc> },
}

/// Compute the cache status from the last update timestamp (ms since epoch).
pub fn cache_status(last_update_ms: Option<i64>, max_age: Duration, now: DateTime<Utc>) -> CacheStatus {
    let Some(last_update) = last_update_ms
        .filter(|ms| *ms > 0)
        .and_then(DateTime::from_timestamp_millis)
    else {
        return CacheStatus::NeedsImmediateUpdate { invalid_at: now };
    };

    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    let invalid_at = last_update
        .checked_add_signed(max_age)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    // Whole days, truncated toward zero.
    let days_remaining = (invalid_at - now).num_days();

    if days_remaining < 1 {
        CacheStatus::NeedsImmediateUpdate { invalid_at }
    } else if days_remaining < 7 {
        CacheStatus::NeedsUpdateSoon { invalid_at }
    } else if days_remaining < 13 {
        CacheStatus::RecentlyUpdated { last_update }
    } else {
        CacheStatus::UpToDate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FOURTEEN_DAYS: Duration = Duration::from_secs(14 * 24 * 60 * 60);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<i64> {
        Some((now() - chrono::Duration::days(days)).timestamp_millis())
    }

    #[test]
    fn never_updated_needs_immediate_update() {
        assert_eq!(
            cache_status(None, FOURTEEN_DAYS, now()),
            CacheStatus::NeedsImmediateUpdate { invalid_at: now() }
        );
    }

    #[test]
    fn fresh_cache_is_up_to_date() {
        assert_eq!(cache_status(days_ago(0), FOURTEEN_DAYS, now()), CacheStatus::UpToDate);
    }

    #[test]
    fn two_days_old_is_recently_updated() {
        match cache_status(days_ago(2), FOURTEEN_DAYS, now()) {
            CacheStatus::RecentlyUpdated { last_update } => {
                assert_eq!(Some(last_update.timestamp_millis()), days_ago(2));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn ten_days_old_needs_update_soon() {
        assert!(matches!(
            cache_status(days_ago(10), FOURTEEN_DAYS, now()),
            CacheStatus::NeedsUpdateSoon { .. }
        ));
    }

    #[test]
    fn last_day_needs_immediate_update() {
        let thirteen_and_a_half_days_ago =
            Some((now() - chrono::Duration::hours(13 * 24 + 12)).timestamp_millis());
        assert!(matches!(
            cache_status(thirteen_and_a_half_days_ago, FOURTEEN_DAYS, now()),
            CacheStatus::NeedsImmediateUpdate { .. }
        ));
        assert!(matches!(
            cache_status(days_ago(30), FOURTEEN_DAYS, now()),
            CacheStatus::NeedsImmediateUpdate { .. }
        ));
    }
}
