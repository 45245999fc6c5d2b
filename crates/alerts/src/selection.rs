//! At-risk selection for a single tick.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pharmatrack_core::{Drug, DrugId};

/// A drug skipped because its stored expiration date does not parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidDrug {
    pub id: DrugId,
    pub expiration_date: String,
    pub reason: String,
}

/// Result of partitioning the inventory for one tick.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Drugs in the alert window, in input order.
    pub at_risk: Vec<Drug>,
    pub invalid: Vec<InvalidDrug>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.at_risk.is_empty()
    }

    pub fn at_risk_ids(&self) -> Vec<DrugId> {
        self.at_risk.iter().map(|d| d.id).collect()
    }

    pub fn invalid_ids(&self) -> Vec<DrugId> {
        self.invalid.iter().map(|d| d.id).collect()
    }
}

/// Select every drug whose bucket is alertable at `now`.
///
/// Membership depends only on each drug's own date, so reordering the
/// input reorders the output and nothing else. Expired drugs are not
/// selected.
pub fn select_at_risk(drugs: &[Drug], now: DateTime<Utc>) -> Selection {
    let mut selection = Selection::default();
    for drug in drugs {
        match drug.risk(now) {
            Ok(bucket) if bucket.is_alertable() => selection.at_risk.push(drug.clone()),
            Ok(_) => {}
            Err(e) => selection.invalid.push(InvalidDrug {
                id: drug.id,
                expiration_date: drug.expiration_date.clone(),
                reason: e.to_string(),
            }),
        }
    }
    selection
}
