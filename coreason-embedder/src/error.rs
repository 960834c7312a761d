use thiserror::Error;

/// Errors raised by an [`crate::Embedder`].
#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
}
