//! Dashboard and analytics aggregates over the drug list.
//!
//! Both views evaluate every drug against a single `now`. Drugs whose
//! stored expiration date cannot be parsed are listed in `invalid` and
//! excluded from every count except `total`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::drug::{Drug, DrugId};
use crate::risk::RiskBucket;

// ── Dashboard ─────────────────────────────────────────────────

/// Number of drugs per [`RiskBucket`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub expired: usize,
    pub within_30: usize,
    pub within_60: usize,
    pub within_90: usize,
    pub within_120: usize,
    pub valid: usize,
}

impl BucketCounts {
    fn slot(&mut self, bucket: RiskBucket) -> &mut usize {
        match bucket {
            RiskBucket::Expired => &mut self.expired,
            RiskBucket::Within30 => &mut self.within_30,
            RiskBucket::Within60 => &mut self.within_60,
            RiskBucket::Within90 => &mut self.within_90,
            RiskBucket::Within120 => &mut self.within_120,
            RiskBucket::Valid => &mut self.valid,
        }
    }

    pub fn record(&mut self, bucket: RiskBucket) {
        *self.slot(bucket) += 1;
    }

    pub fn get(&self, bucket: RiskBucket) -> usize {
        match bucket {
            RiskBucket::Expired => self.expired,
            RiskBucket::Within30 => self.within_30,
            RiskBucket::Within60 => self.within_60,
            RiskBucket::Within90 => self.within_90,
            RiskBucket::Within120 => self.within_120,
            RiskBucket::Valid => self.valid,
        }
    }

    /// Drugs inside the 120-day horizon that have not expired yet.
    pub fn expiring_soon(&self) -> usize {
        self.within_30 + self.within_60 + self.within_90 + self.within_120
    }
}

/// A dashboard row for a drug nearing expiration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringDrug {
    pub id: DrugId,
    pub brand_name: String,
    pub batch_number: String,
    pub expiration_date: NaiveDate,
    pub days_until_expiry: i64,
    pub risk: RiskBucket,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub counts: BucketCounts,
    pub expiring_soon_count: usize,
    /// Within 30..120 days, soonest first.
    pub expiring_soon: Vec<ExpiringDrug>,
    pub invalid: Vec<DrugId>,
}

pub fn dashboard(drugs: &[Drug], now: DateTime<Utc>) -> DashboardSummary {
    let mut counts = BucketCounts::default();
    let mut expiring_soon = Vec::new();
    let mut invalid = Vec::new();

    for drug in drugs {
        let expires_on = match drug.expires_on() {
            Ok(d) => d,
            Err(_) => {
                invalid.push(drug.id);
                continue;
            }
        };
        let days = crate::risk::days_until_expiry(expires_on, now);
        let bucket = RiskBucket::from_days(days);
        counts.record(bucket);

        if bucket.is_expiring_soon() {
            expiring_soon.push(ExpiringDrug {
                id: drug.id,
                brand_name: drug.brand_name.clone(),
                batch_number: drug.batch_number.clone(),
                expiration_date: expires_on,
                days_until_expiry: days,
                risk: bucket,
                label: bucket.label(),
            });
        }
    }

    expiring_soon.sort_by_key(|d| (d.expiration_date, d.id));

    DashboardSummary {
        total: drugs.len(),
        expiring_soon_count: counts.expiring_soon(),
        counts,
        expiring_soon,
        invalid,
    }
}

// ── Analytics report ──────────────────────────────────────────

/// Coarse expiration timeline used by the analytics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineBucket {
    Expired,
    Within30,
    Within90,
    Within180,
    Beyond180,
}

impl TimelineBucket {
    pub const ALL: [TimelineBucket; 5] = [
        TimelineBucket::Expired,
        TimelineBucket::Within30,
        TimelineBucket::Within90,
        TimelineBucket::Within180,
        TimelineBucket::Beyond180,
    ];

    pub fn from_days(days: i64) -> Self {
        match days {
            i64::MIN..=0 => TimelineBucket::Expired,
            1..=30 => TimelineBucket::Within30,
            31..=90 => TimelineBucket::Within90,
            91..=180 => TimelineBucket::Within180,
            _ => TimelineBucket::Beyond180,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelineBucket::Expired => "Expired",
            TimelineBucket::Within30 => "30 Days",
            TimelineBucket::Within90 => "90 Days",
            TimelineBucket::Within180 => "180 Days",
            TimelineBucket::Beyond180 => ">180 Days",
        }
    }
}

/// A named count, shaped for chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub total: usize,
    pub expired: usize,
    pub expiring_30_days: usize,
    pub timeline: Vec<NamedCount>,
    pub dosage_forms: Vec<NamedCount>,
    pub dosage_form_count: usize,
    pub invalid: Vec<DrugId>,
}

pub fn inventory_report(drugs: &[Drug], now: DateTime<Utc>) -> InventoryReport {
    let mut timeline: BTreeMap<TimelineBucket, usize> =
        TimelineBucket::ALL.iter().map(|b| (*b, 0)).collect();
    let mut dosage_forms: BTreeMap<&str, usize> = BTreeMap::new();
    let mut invalid = Vec::new();

    for drug in drugs {
        *dosage_forms.entry(drug.dosage_form.as_str()).or_default() += 1;

        match drug.days_until_expiry(now) {
            Ok(days) => *timeline.entry(TimelineBucket::from_days(days)).or_default() += 1,
            Err(_) => invalid.push(drug.id),
        }
    }

    let count = |b: TimelineBucket| timeline.get(&b).copied().unwrap_or(0);

    InventoryReport {
        total: drugs.len(),
        expired: count(TimelineBucket::Expired),
        expiring_30_days: count(TimelineBucket::Within30),
        timeline: timeline
            .iter()
            .map(|(b, v)| NamedCount {
                name: b.label().to_string(),
                value: *v,
            })
            .collect(),
        dosage_form_count: dosage_forms.len(),
        dosage_forms: dosage_forms
            .into_iter()
            .map(|(name, value)| NamedCount {
                name: name.to_string(),
                value,
            })
            .collect(),
        invalid,
    }
}
