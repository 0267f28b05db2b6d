//! Transform error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Storage error: {0}")]
    Storage(#[from] ingest_storage::StorageError),
}
