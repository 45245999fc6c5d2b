//! Periodic expiration alert loop.
//!
//! Each tick loads the inventory and the opted-in accounts, selects the
//! drugs inside the alert window, and sends one message per account that
//! lists all of them. Failures are contained to the send or tick they
//! occur in; the loop itself never stops.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use pharmatrack_core::config::{AlertConfig, MAX_ALERT_PERIOD_SECS};
use pharmatrack_core::DrugId;
use pharmatrack_notify::Notifier;
use pharmatrack_storage::Repository;

use crate::error::AlertError;
use crate::selection::select_at_risk;

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSettings {
    /// Time between ticks. The first tick fires one interval after start.
    pub interval: Duration,
    /// Upper bound on a single `send`. Expiry counts as a failed send.
    pub send_timeout: Duration,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

impl From<&AlertConfig> for AlertSettings {
    fn from(config: &AlertConfig) -> Self {
        Self {
            interval: config.interval(),
            send_timeout: config.send_timeout(),
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub now: DateTime<Utc>,
    pub at_risk: Vec<DrugId>,
    /// Drugs skipped because their stored date does not parse.
    pub invalid: Vec<DrugId>,
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct AlertScheduler {
    repo: Arc<dyn Repository>,
    notifier: Arc<dyn Notifier>,
    settings: AlertSettings,
}

impl AlertScheduler {
    pub fn new(
        repo: Arc<dyn Repository>,
        notifier: Arc<dyn Notifier>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            repo,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> AlertSettings {
        self.settings
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Run one tick relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Storage`] when drugs or accounts cannot be
    /// loaded. Send failures are counted in the report, not returned.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, AlertError> {
        let drugs = self.repo.list_drugs().await?;
        let accounts = self.repo.list_notifiable_accounts().await?;

        let selection = select_at_risk(&drugs, now);
        for skipped in &selection.invalid {
            warn!(
                drug_id = skipped.id,
                expiration_date = %skipped.expiration_date,
                "skipping drug with unparseable expiration date"
            );
        }

        let mut report = TickReport {
            now,
            at_risk: selection.at_risk_ids(),
            invalid: selection.invalid_ids(),
            recipients: 0,
            delivered: 0,
            failed: 0,
        };

        if selection.is_empty() {
            debug!(drugs = drugs.len(), "no drugs inside the alert window");
            return Ok(report);
        }

        let addresses: Vec<&str> = accounts.iter().filter_map(|a| a.alert_address()).collect();
        report.recipients = addresses.len();
        info!(
            at_risk = selection.at_risk.len(),
            recipients = addresses.len(),
            channel = self.notifier.channel_name(),
            "sending expiration alerts"
        );

        for address in addresses {
            let send = self.notifier.send_at(address, &selection.at_risk, now);
            match tokio::time::timeout(self.settings.send_timeout, send).await {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(recipient = address, error = %e, "failed to send expiration alert");
                }
                Err(_) => {
                    report.failed += 1;
                    warn!(
                        recipient = address,
                        timeout_secs = self.settings.send_timeout.as_secs_f64(),
                        "expiration alert timed out"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Run one tick and log the outcome. Errors are never propagated.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Option<TickReport> {
        match self.tick(now).await {
            Ok(report) => {
                info!(
                    at_risk = report.at_risk.len(),
                    invalid = report.invalid.len(),
                    recipients = report.recipients,
                    delivered = report.delivered,
                    failed = report.failed,
                    "alert tick complete"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "alert tick failed");
                None
            }
        }
    }

    /// Tick forever at the configured interval.
    ///
    /// Intervals the clock cannot represent fall back to the longest
    /// configurable one.
    pub async fn run(self: Arc<Self>) {
        let start = Instant::now();
        let (first, period) = match start.checked_add(self.settings.interval) {
            Some(first) if !self.settings.interval.is_zero() => (first, self.settings.interval),
            _ => {
                let fallback = Duration::from_secs(MAX_ALERT_PERIOD_SECS);
                warn!(
                    requested_secs = self.settings.interval.as_secs(),
                    fallback_secs = fallback.as_secs(),
                    "alert interval out of range, using fallback"
                );
                (start + fallback, fallback)
            }
        };
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            channel = self.notifier.channel_name(),
            "alert scheduler started"
        );

        loop {
            ticker.tick().await;
            self.run_tick(Utc::now()).await;
        }
    }

    /// Spawn [`Self::run`] on the current runtime.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
