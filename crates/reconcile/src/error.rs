//! Error types for reconciliation and the dedup sweep.

use review_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Primary store fetch failed; no partial view is returned
    #[error("Failed to fetch primary reviews: {0}")]
    PrimaryFetch(#[source] StoreError),

    /// Legacy store fetch failed; no partial view is returned
    #[error("Failed to fetch legacy reviews: {0}")]
    LegacyFetch(#[source] StoreError),

    /// A superseded duplicate could not be deleted
    #[error("Failed to delete duplicate review {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: StoreError,
    },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
