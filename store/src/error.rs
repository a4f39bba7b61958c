use thiserror::Error;

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A second vote for the same `(proposal, voter)` or a reused entity id.
    #[error("record already exists: {0}")]
    Duplicate(String),

    /// A stored record could not be decoded or fails its own checks.
    #[error("stored record is corrupted: {0}")]
    Corruption(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}
