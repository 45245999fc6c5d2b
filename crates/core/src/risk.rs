//! Expiration risk classification.
//!
//! Maps an expiration date and a reference instant to a [`RiskBucket`].
//! The reference instant is always passed in, never read from a live clock,
//! so classification is deterministic for fixed inputs.
//!
//! Day counts are `floor((expiration - now) / 1 day)` with the expiration
//! date taken as midnight UTC. Buckets use half-open intervals with an
//! inclusive upper bound: 0 days left is [`RiskBucket::Expired`], 30 days
//! left is still [`RiskBucket::Within30`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Records in this window are alertable.
pub const ALERT_WINDOW_DAYS: i64 = 30;

/// Proximity of a record to its expiration date.
///
/// Variants are ordered from most to least urgent, so `a < b` means `a` is
/// more urgent than `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Expired,
    Within30,
    Within60,
    Within90,
    Within120,
    Valid,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 6] = [
        RiskBucket::Expired,
        RiskBucket::Within30,
        RiskBucket::Within60,
        RiskBucket::Within90,
        RiskBucket::Within120,
        RiskBucket::Valid,
    ];

    /// Bucket for a precomputed day count.
    pub fn from_days(days: i64) -> Self {
        match days {
            i64::MIN..=0 => RiskBucket::Expired,
            1..=30 => RiskBucket::Within30,
            31..=60 => RiskBucket::Within60,
            61..=90 => RiskBucket::Within90,
            91..=120 => RiskBucket::Within120,
            _ => RiskBucket::Valid,
        }
    }

    /// Only records expiring within the alert window trigger notifications.
    pub fn is_alertable(self) -> bool {
        self == RiskBucket::Within30
    }

    /// Not yet expired but inside the 120-day horizon.
    pub fn is_expiring_soon(self) -> bool {
        matches!(
            self,
            RiskBucket::Within30 | RiskBucket::Within60 | RiskBucket::Within90 | RiskBucket::Within120
        )
    }

    /// Badge text shown on the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::Expired => "Expired",
            RiskBucket::Within30 => "Within 30 days",
            RiskBucket::Within60 => "Within 60 days",
            RiskBucket::Within90 => "Within 90 days",
            RiskBucket::Within120 => "Within 120 days",
            RiskBucket::Valid => "Valid",
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole days from `now` until midnight UTC of `expiration`, rounded down.
///
/// Negative when the date has passed.
pub fn days_until_expiry(expiration: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expires_at = expiration.and_time(NaiveTime::MIN).and_utc();
    (expires_at - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Classify an expiration date relative to `now`.
pub fn classify(expiration: NaiveDate, now: DateTime<Utc>) -> RiskBucket {
    RiskBucket::from_days(days_until_expiry(expiration, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn zero_days_is_expired() {
        let now = midnight(2024, 1, 1);
        assert_eq!(days_until_expiry(date(2024, 1, 1), now), 0);
        assert_eq!(classify(date(2024, 1, 1), now), RiskBucket::Expired);
    }

    #[test]
    fn one_day_is_alertable() {
        let now = midnight(2024, 1, 1);
        let bucket = classify(date(2024, 1, 2), now);
        assert_eq!(bucket, RiskBucket::Within30);
        assert!(bucket.is_alertable());
    }

    #[test]
    fn upper_bounds_are_inclusive() {
        let cases = [
            (30, RiskBucket::Within30),
            (31, RiskBucket::Within60),
            (60, RiskBucket::Within60),
            (61, RiskBucket::Within90),
            (90, RiskBucket::Within90),
            (91, RiskBucket::Within120),
            (120, RiskBucket::Within120),
            (121, RiskBucket::Valid),
        ];
        let now = midnight(2024, 3, 1);
        for (days, expected) in cases {
            let expiration = (now + Duration::days(days)).date_naive();
            assert_eq!(days_until_expiry(expiration, now), days);
            assert_eq!(classify(expiration, now), expected, "days = {days}");
            assert_eq!(RiskBucket::from_days(days), expected, "days = {days}");
        }
    }

    #[test]
    fn past_dates_are_expired() {
        let now = midnight(2024, 1, 1);
        assert_eq!(days_until_expiry(date(2023, 12, 1), now), -31);
        assert_eq!(classify(date(2023, 12, 1), now), RiskBucket::Expired);
        assert_eq!(RiskBucket::from_days(i64::MIN), RiskBucket::Expired);
        assert_eq!(RiskBucket::from_days(i64::MAX), RiskBucket::Valid);
    }

    #[test]
    fn partial_days_round_down() {
        // 14 days and 12 hours left counts as 14.
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until_expiry(date(2024, 1, 16), now), 14);
        // Less than one day left is already expired.
        let late = Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap();
        assert_eq!(days_until_expiry(date(2024, 1, 16), late), 0);
        assert_eq!(classify(date(2024, 1, 16), late), RiskBucket::Expired);
    }

    #[test]
    fn bucket_never_becomes_less_urgent_as_time_advances() {
        let expiration = date(2024, 6, 1);
        let mut now = midnight(2023, 12, 1);
        let mut previous = classify(expiration, now);
        while now < midnight(2024, 7, 1) {
            now += Duration::hours(7);
            let current = classify(expiration, now);
            assert!(current <= previous, "{current:?} after {previous:?} at {now}");
            previous = current;
        }
        assert_eq!(previous, RiskBucket::Expired);
    }

    #[test]
    fn every_day_count_maps_to_exactly_one_bucket() {
        for days in -400..=400 {
            let bucket = RiskBucket::from_days(days);
            assert_eq!(
                RiskBucket::ALL.iter().filter(|b| **b == bucket).count(),
                1
            );
        }
    }

    #[test]
    fn expiring_soon_excludes_expired_and_valid() {
        assert!(!RiskBucket::Expired.is_expiring_soon());
        assert!(!RiskBucket::Valid.is_expiring_soon());
        assert!(RiskBucket::Within120.is_expiring_soon());
        assert_eq!(RiskBucket::Within60.to_string(), "Within 60 days");
    }
}
