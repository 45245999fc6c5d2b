//! Persistence for drugs and accounts.
//!
//! [`Repository`] is the capability the rest of the workspace depends on.
//! [`open_repository`] picks PostgreSQL when configured and falls back to
//! the in-memory store otherwise.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use tracing::{info, warn};

pub use error::StorageError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;

/// Select a backend from config.
///
/// A configured but unreachable database is an error; an unconfigured one
/// means the in-memory store.
pub async fn open_repository(
    config: &pharmatrack_core::Config,
) -> Result<Arc<dyn Repository>, StorageError> {
    if config.postgres.is_configured() {
        let store = PgStore::connect(&config.postgres).await?;
        info!("Storage: postgres backend ({})", config.postgres.database);
        Ok(Arc::new(store))
    } else {
        warn!("PostgreSQL not configured, using in-memory store (data is lost on restart)");
        Ok(Arc::new(MemoryStore::new()))
    }
}
