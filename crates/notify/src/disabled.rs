//! Degraded notifier used when outbound mail is not configured.

use pharmatrack_core::Drug;

use crate::traits::{Notifier, NotifyError};

/// Reports failure for every send without contacting anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, address: &str, drugs: &[Drug]) -> Result<(), NotifyError> {
        tracing::debug!(
            channel = "disabled",
            address,
            drugs = drugs.len(),
            "Cannot send email: SMTP not configured"
        );
        Err(NotifyError::NotConfigured)
    }

    fn channel_name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
