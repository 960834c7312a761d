use coreason_embedder::EmbedderError;
use coreason_types::ManifestError;
use coreason_vector_index::VectorIndexError;
use thiserror::Error;

/// Errors raised while registering a source manifest (§4.4).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector index storage fault: {0}")]
    StorageFault(String),
}

impl From<EmbedderError> for RegistryError {
    fn from(e: EmbedderError) -> Self {
        let EmbedderError::EmbeddingFailed(msg) = e;
        RegistryError::EmbeddingFailed(msg)
    }
}

impl From<VectorIndexError> for RegistryError {
    fn from(e: VectorIndexError) -> Self {
        match e {
            VectorIndexError::DimensionMismatch { expected, actual } => {
                RegistryError::DimensionMismatch { expected, actual }
            }
            VectorIndexError::InvalidFilter(msg) => RegistryError::StorageFault(msg),
            VectorIndexError::StorageFault(msg) => RegistryError::StorageFault(msg),
        }
    }
}
