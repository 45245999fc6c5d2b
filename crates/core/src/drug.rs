//! Tracked pharmaceutical batches.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::risk::{self, RiskBucket};

pub type DrugId = i64;

/// Status assigned to every newly created drug.
pub const DEFAULT_STATUS: &str = "active";

/// A tracked batch. `expiration_date` is kept as the stored text
/// (`YYYY-MM` or `YYYY-MM-DD`) and parsed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    pub id: DrugId,
    pub generic_name: String,
    pub brand_name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiration_date: String,
    pub dosage_form: String,
    pub strength: String,
    pub quantity: i32,
    pub storage_conditions: String,
    pub packaging: String,
    pub composition: String,
    pub indication: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Drug {
    pub fn expires_on(&self) -> Result<NaiveDate, CoreError> {
        parse_expiration_date(&self.expiration_date)
    }

    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> Result<i64, CoreError> {
        Ok(risk::days_until_expiry(self.expires_on()?, now))
    }

    pub fn risk(&self, now: DateTime<Utc>) -> Result<RiskBucket, CoreError> {
        Ok(risk::classify(self.expires_on()?, now))
    }
}

/// Parse a stored expiration date.
///
/// `YYYY-MM-DD` is taken as-is; `YYYY-MM` means the first day of that month.
pub fn parse_expiration_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let invalid = || CoreError::InvalidExpirationDate(raw.to_string());
    let trimmed = raw.trim();
    let parts: Vec<&str> = trimmed.split('-').collect();

    let (year, month, day) = match parts.as_slice() {
        [y, m] if y.len() == 4 && m.len() == 2 => (*y, *m, "01"),
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => (*y, *m, *d),
        _ => return Err(invalid()),
    };

    if ![year, month, day]
        .iter()
        .all(|p| p.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Request body for creating a drug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrug {
    pub generic_name: String,
    pub brand_name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiration_date: String,
    pub dosage_form: String,
    pub strength: String,
    pub quantity: i32,
    pub storage_conditions: String,
    pub packaging: String,
    pub composition: String,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default)]
    pub contraindications: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
}

impl NewDrug {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_non_empty("generic_name", &self.generic_name)?;
        require_non_empty("brand_name", &self.brand_name)?;
        require_non_empty("manufacturer", &self.manufacturer)?;
        require_non_empty("batch_number", &self.batch_number)?;
        require_non_empty("dosage_form", &self.dosage_form)?;
        if self.quantity < 0 {
            return Err(CoreError::Validation(
                "quantity must not be negative".to_string(),
            ));
        }
        parse_expiration_date(&self.expiration_date)?;
        Ok(())
    }

    /// Materialize a stored drug with the given id and creation time.
    pub fn into_drug(self, id: DrugId, created_at: DateTime<Utc>) -> Drug {
        Drug {
            id,
            generic_name: self.generic_name,
            brand_name: self.brand_name,
            manufacturer: self.manufacturer,
            batch_number: self.batch_number,
            expiration_date: self.expiration_date.trim().to_string(),
            dosage_form: self.dosage_form,
            strength: self.strength,
            quantity: self.quantity,
            storage_conditions: self.storage_conditions,
            packaging: self.packaging,
            composition: self.composition,
            indication: self.indication,
            contraindications: self.contraindications,
            side_effects: self.side_effects,
            status: DEFAULT_STATUS.to_string(),
            created_at,
        }
    }
}

/// Partial update for a drug (all fields optional).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrugPatch {
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub expiration_date: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub quantity: Option<i32>,
    pub storage_conditions: Option<String>,
    pub packaging: Option<String>,
    pub composition: Option<String>,
    pub indication: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub status: Option<String>,
}

impl DrugPatch {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(date) = &self.expiration_date {
            parse_expiration_date(date)?;
        }
        if let Some(q) = self.quantity {
            if q < 0 {
                return Err(CoreError::Validation(
                    "quantity must not be negative".to_string(),
                ));
            }
        }
        for (field, value) in [
            ("generic_name", &self.generic_name),
            ("brand_name", &self.brand_name),
            ("manufacturer", &self.manufacturer),
            ("batch_number", &self.batch_number),
        ] {
            if let Some(v) = value {
                require_non_empty(field, v)?;
            }
        }
        Ok(())
    }

    /// Overwrite every field present in the patch.
    pub fn apply(self, drug: &mut Drug) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }

        set(&mut drug.generic_name, self.generic_name);
        set(&mut drug.brand_name, self.brand_name);
        set(&mut drug.manufacturer, self.manufacturer);
        set(&mut drug.batch_number, self.batch_number);
        set(
            &mut drug.expiration_date,
            self.expiration_date.map(|d| d.trim().to_string()),
        );
        set(&mut drug.dosage_form, self.dosage_form);
        set(&mut drug.strength, self.strength);
        set(&mut drug.quantity, self.quantity);
        set(&mut drug.storage_conditions, self.storage_conditions);
        set(&mut drug.packaging, self.packaging);
        set(&mut drug.composition, self.composition);
        set(&mut drug.status, self.status);
        if self.indication.is_some() {
            drug.indication = self.indication;
        }
        if self.contraindications.is_some() {
            drug.contraindications = self.contraindications;
        }
        if self.side_effects.is_some() {
            drug.side_effects = self.side_effects;
        }
    }
}
