//! Shared application state handed to every handler.

use std::sync::Arc;

use pharmatrack_alerts::{AlertScheduler, AlertSettings};
use pharmatrack_core::Config;
use pharmatrack_notify::Notifier;
use pharmatrack_storage::Repository;

use crate::session::SessionStore;

pub struct AppState {
    pub config: Config,
    pub repo: Arc<dyn Repository>,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<AlertScheduler>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn Repository>, notifier: Arc<dyn Notifier>) -> Self {
        let scheduler = Arc::new(AlertScheduler::new(
            repo.clone(),
            notifier.clone(),
            AlertSettings::from(&config.alerts),
        ));
        let sessions = SessionStore::new(config.server.session_ttl());
        Self {
            config,
            repo,
            notifier,
            scheduler,
            sessions,
        }
    }
}
