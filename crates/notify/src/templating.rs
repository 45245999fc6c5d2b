//! Minijinja template rendering for expiration alert emails.
//!
//! Templates are compiled once into a shared [`minijinja::Environment`].
//! The HTML template name ends in `.html`, which turns on HTML
//! auto-escaping for drug names and batch numbers.

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;

use pharmatrack_core::Drug;

use crate::traits::NotifyError;

/// Subject line for every expiration alert.
pub const ALERT_SUBJECT: &str = "Drug Expiration Alert";

const HTML_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Drug Expiration Alert</h2>
  <p>The following drugs are approaching their expiration date:</p>

  <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">
    <thead>
      <tr style="background-color: #f8f9fa;">
        <th style="padding: 10px; text-align: left;">Drug Name</th>
        <th style="padding: 10px; text-align: left;">Batch Number</th>
        <th style="padding: 10px; text-align: left;">Expiry Date</th>
        <th style="padding: 10px; text-align: left;">Days Until Expiry</th>
      </tr>
    </thead>
    <tbody>
{%- for row in rows %}
      <tr>
        <td style="padding: 10px; border-bottom: 1px solid #eee;">{{ row.brand_name }}</td>
        <td style="padding: 10px; border-bottom: 1px solid #eee;">{{ row.batch_number }}</td>
        <td style="padding: 10px; border-bottom: 1px solid #eee;">{{ row.expiry_date }}</td>
        <td style="padding: 10px; border-bottom: 1px solid #eee;">{{ row.days_until_expiry | days }}</td>
      </tr>
{%- endfor %}
    </tbody>
  </table>

  <p style="margin-top: 20px;">
    Please take necessary action to manage these medications before they expire.
  </p>

  <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; color: #666; font-size: 12px;">
    This is an automated notification from your Drug Expiry Management System.
  </div>
</div>
"#;

const TEXT_TEMPLATE: &str = r#"Drug Expiration Alert

The following drugs are approaching their expiration date:
{% for row in rows %}
- {{ row.brand_name }} (batch {{ row.batch_number }}): expires {{ row.expiry_date }}, {{ row.days_until_expiry | days }}
{%- endfor %}

Please take necessary action to manage these medications before they expire.

This is an automated notification from your Drug Expiry Management System.
"#;

/// One table row in the alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub brand_name: String,
    pub batch_number: String,
    pub expiry_date: String,
    /// `None` when the stored date cannot be parsed.
    pub days_until_expiry: Option<i64>,
}

/// Context data available to alert templates.
#[derive(Debug, Clone, Serialize)]
pub struct AlertContext {
    pub rows: Vec<AlertRow>,
    /// Generation timestamp in ISO 8601 format.
    pub now: String,
}

impl AlertContext {
    pub fn new(drugs: &[Drug], now: DateTime<Utc>) -> Self {
        let rows = drugs
            .iter()
            .map(|drug| {
                let expires_on = drug.expires_on().ok();
                AlertRow {
                    brand_name: drug.brand_name.clone(),
                    batch_number: drug.batch_number.clone(),
                    expiry_date: expires_on
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| drug.expiration_date.clone()),
                    days_until_expiry: expires_on
                        .map(|d| pharmatrack_core::days_until_expiry(d, now)),
                }
            })
            .collect();
        Self {
            rows,
            now: now.to_rfc3339(),
        }
    }
}

/// A rendered alert ready for the transport.
#[derive(Debug, Clone)]
pub struct RenderedAlert {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Renders alert emails from the built-in templates.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Compile the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if a template fails to parse.
    pub fn new() -> Result<Self, NotifyError> {
        let mut env = Environment::new();
        env.add_filter("days", days_filter);
        env.add_template("alert.html", HTML_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        env.add_template("alert.txt", TEXT_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { env })
    }

    fn render_named(&self, name: &str, ctx: &AlertContext) -> Result<String, NotifyError> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Render subject, HTML body and plain-text body for `drugs`.
    pub fn render_alert(&self, drugs: &[Drug], now: DateTime<Utc>) -> Result<RenderedAlert, NotifyError> {
        let ctx = AlertContext::new(drugs, now);
        Ok(RenderedAlert {
            subject: ALERT_SUBJECT.to_string(),
            html: self.render_named("alert.html", &ctx)?,
            text: self.render_named("alert.txt", &ctx)?,
        })
    }
}

/// Custom filter: `14` -> `"14 days"`, missing -> `"unknown"`.
fn days_filter(value: Option<i64>) -> String {
    match value {
        Some(1) => "1 day".to_string(),
        Some(n) => format!("{n} days"),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn drug(brand: &str, batch: &str, expiration: &str) -> Drug {
        Drug {
            id: 1,
            generic_name: "amoxicillin".to_string(),
            brand_name: brand.to_string(),
            manufacturer: "Acme".to_string(),
            batch_number: batch.to_string(),
            expiration_date: expiration.to_string(),
            dosage_form: "capsule".to_string(),
            strength: "250mg".to_string(),
            quantity: 20,
            storage_conditions: "cool".to_string(),
            packaging: "bottle".to_string(),
            composition: "amoxicillin".to_string(),
            indication: None,
            contraindications: None,
            side_effects: None,
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn renders_one_row_per_drug() {
        let renderer = TemplateRenderer::new().unwrap();
        let drugs = vec![drug("Amoxil", "AX-1", "2024-01-15"), drug("Zyrtec", "ZY-9", "2024-01-02")];
        let alert = renderer.render_alert(&drugs, now()).unwrap();

        assert_eq!(alert.subject, "Drug Expiration Alert");
        assert_eq!(alert.html.matches("<tr>").count(), 2);
        assert!(alert.html.contains("Amoxil"));
        assert!(alert.html.contains("AX-1"));
        assert!(alert.html.contains("2024-01-15"));
        assert!(alert.html.contains("14 days"));
        assert!(alert.html.contains("1 day<"));
        assert!(alert.text.contains("- Zyrtec (batch ZY-9): expires 2024-01-02, 1 day"));
    }

    #[test]
    fn html_escapes_drug_fields() {
        let renderer = TemplateRenderer::new().unwrap();
        let drugs = vec![drug("<script>x</script>", "B&1", "2024-01-15")];
        let alert = renderer.render_alert(&drugs, now()).unwrap();
        assert!(!alert.html.contains("<script>"));
        assert!(alert.html.contains("&lt;script&gt;"));
        assert!(alert.html.contains("B&amp;1"));
    }

    #[test]
    fn month_dates_render_as_first_of_month() {
        let ctx = AlertContext::new(&[drug("A", "B", "2024-02")], now());
        assert_eq!(ctx.rows[0].expiry_date, "2024-02-01");
        assert_eq!(ctx.rows[0].days_until_expiry, Some(31));
    }

    #[test]
    fn unparseable_dates_render_raw() {
        let ctx = AlertContext::new(&[drug("A", "B", "someday")], now());
        assert_eq!(ctx.rows[0].expiry_date, "someday");
        assert_eq!(ctx.rows[0].days_until_expiry, None);
        assert_eq!(days_filter(None), "unknown");
    }
}
