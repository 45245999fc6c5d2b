//! Server startup: shared state initialization and background task spawning.

use std::sync::Arc;

use tracing::info;

use pharmatrack_core::Config;
use pharmatrack_notify::notifier_from_config;
use pharmatrack_storage::open_repository;

use crate::router::build_router;
use crate::state::AppState;

/// Open storage, pick the notifier and build `AppState`.
pub async fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let repo = open_repository(config).await?;
    let notifier = notifier_from_config(&config.smtp);
    info!(
        backend = repo.backend_name(),
        notifier = notifier.channel_name(),
        notifier_enabled = notifier.is_enabled(),
        "application state ready"
    );
    Ok(Arc::new(AppState::new(config.clone(), repo, notifier)))
}

/// Start the alert scheduler unless disabled by config.
pub fn spawn_background_tasks(state: &Arc<AppState>) {
    if state.config.alerts.enabled {
        state.scheduler.clone().spawn();
    } else {
        info!("Alert scheduler disabled (ALERTS_ENABLED=false)");
    }
}

/// Run the HTTP API until the process is stopped.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = build_app_state(config).await?;
    spawn_background_tasks(&state);

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}
