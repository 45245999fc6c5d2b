use thiserror::Error;

use pharmatrack_storage::StorageError;

#[derive(Error, Debug)]
pub enum AlertError {
    /// Drugs or accounts could not be loaded; the tick is abandoned.
    #[error("alert tick aborted: {0}")]
    Storage(#[from] StorageError),
}
