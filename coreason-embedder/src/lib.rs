//! Text → fixed-dimension vector embedding.
//!
//! The core's contract treats the embedding model as opaque (§1, §4.1): callers only need
//! `embed`/`embed_batch` to produce [`EMBEDDING_DIM`]-length vectors, deterministically for
//! the same input. The reference [`HashEmbedder`] satisfies that contract with a feature
//! hashing scheme instead of a real model, so the broker pipeline and its failure modes can
//! be exercised without any external service; swap in a different `Embedder` to plug in a
//! real backend later.

mod error;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use coreason_types::{Embedding, EMBEDDING_DIM};

pub use error::EmbedderError;

/// Text → fixed-dimension vector embedding.
pub trait Embedder: Send + Sync {
    /// Embed a single text string. Empty/whitespace input is valid and must still produce
    /// a vector of [`EMBEDDING_DIM`] elements.
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError>;

    /// Embed a batch of text strings. The default implementation embeds one at a time;
    /// override it if a backend supports true batching.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Deterministic, dependency-free embedder using the hashing trick (feature hashing):
/// each whitespace token is hashed into one of [`EMBEDDING_DIM`] buckets with a random sign,
/// and the resulting vector is L2-normalized. Same text always yields the same vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let mut vector = vec![0f32; EMBEDDING_DIM];

        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h as usize) % EMBEDDING_DIM;
            let sign = if (h >> 63) & 1 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }

        Ok(vector)
    }
}

/// Test doubles shared with downstream crates (enabled via the `test-util` feature),
/// mirroring the pattern tokio itself uses for its own `test-util` feature.
#[cfg(feature = "test-util")]
pub mod test_util {
    use super::{Embedder, EmbedderError};
    use coreason_types::Embedding;

    /// An embedder that always fails, for exercising the `EmbeddingFailed` broker path.
    #[derive(Debug, Default)]
    pub struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Embedding, EmbedderError> {
            Err(EmbedderError::EmbeddingFailed("simulated model failure".into()))
        }
    }
}


#[cfg(all(test, feature = "test-util"))]
mod failing_embedder_tests {
    use super::Embedder;
    use crate::test_util::FailingEmbedder;

    #[test]
    fn failing_embedder_reports_embedding_failed() {
        let err = FailingEmbedder.embed("anything").unwrap_err();
        assert!(matches!(err, crate::EmbedderError::EmbeddingFailed(_)));
    }
}
