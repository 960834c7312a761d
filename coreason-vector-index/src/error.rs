use thiserror::Error;

/// Errors raised by a [`crate::VectorIndex`].
#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("malformed search filter: {0}")]
    InvalidFilter(String),

    #[error("storage fault: {0}")]
    StorageFault(String),
}
