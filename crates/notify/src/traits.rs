//! Notifier trait definition and shared error types.

use chrono::{DateTime, Utc};

use pharmatrack_core::Drug;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid recipient address: '{0}'")]
    InvalidRecipient(String),

    #[error("Notifications disabled: SMTP not configured")]
    NotConfigured,
}

/// Delivers an expiration alert to a single address.
///
/// `Ok(())` means the message was handed to the transport; any `Err` means
/// it was not. Implementations report unavailability through the error and
/// never panic.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send one message listing every drug in `drugs`.
    async fn send(&self, address: &str, drugs: &[Drug]) -> Result<(), NotifyError>;

    /// Like [`send`](Self::send), with any relative dates in the message
    /// computed against `now` instead of the wall clock.
    async fn send_at(
        &self,
        address: &str,
        drugs: &[Drug],
        _now: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        self.send(address, drugs).await
    }

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;

    /// `false` when running in degraded mode where every send fails.
    fn is_enabled(&self) -> bool {
        true
    }
}
