//! Expiration alert delivery.
//!
//! This crate provides:
//! - `Notifier` trait for delivering an alert to one address
//! - SMTP email notifier and a disabled fallback for degraded mode
//! - Minijinja template rendering for alert messages

pub mod disabled;
pub mod email;
pub mod templating;
pub mod traits;

use std::sync::Arc;

use pharmatrack_core::config::SmtpConfig;

pub use disabled::DisabledNotifier;
pub use email::{parse_recipient, EmailNotifier};
pub use templating::{RenderedAlert, TemplateRenderer};
pub use traits::{Notifier, NotifyError};

/// Build the notifier for this process.
///
/// Missing or unusable SMTP settings degrade to [`DisabledNotifier`]; the
/// rest of the system keeps running and every send reports failure.
pub fn notifier_from_config(config: &SmtpConfig) -> Arc<dyn Notifier> {
    if !config.is_configured() {
        tracing::warn!("SMTP not configured. Email notifications will be disabled");
        return Arc::new(DisabledNotifier);
    }

    match EmailNotifier::from_config(config) {
        Ok(notifier) => {
            tracing::info!(
                host = config.host.as_deref().unwrap_or_default(),
                from = %config.from_email,
                "email notifications enabled"
            );
            Arc::new(notifier)
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid SMTP settings, email notifications will be disabled");
            Arc::new(DisabledNotifier)
        }
    }
}
