//! Fixed-dimension vector type shared by the embedder, the vector index, and the registry.

/// Dimension every [`Embedding`] must have, at both insert and query time.
pub const EMBEDDING_DIM: usize = 384;

/// A dense embedding vector. Always [`EMBEDDING_DIM`] elements long when produced by a
/// conforming `Embedder`, but callers should still check `.len()` at trust boundaries.
pub type Embedding = Vec<f32>;
