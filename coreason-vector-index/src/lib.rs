//! Durable, concurrency-safe storage and k-nearest search over registered source manifests.
//!
//! The physical storage engine is explicitly out of the core's scope (§1) — `VectorIndex`
//! is a trait so a real vector database can be dropped in later. [`InMemoryVectorIndex`] is
//! the reference implementation: a `DashMap` keyed by URN, with an optional on-disk
//! snapshot for the durability note in §6.

mod error;
mod filter;

use std::path::PathBuf;

use async_trait::async_trait;
use coreason_types::{Embedding, SourceManifest, EMBEDDING_DIM};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

pub use error::VectorIndexError;
pub use filter::SearchFilter;

/// Persist source records keyed by URN; k-nearest vector search with optional structured
/// filter.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Delete any existing record with the same URN, then insert. Concurrent upserts of
    /// distinct URNs must not lose records; concurrent upserts of the same URN are
    /// last-writer-wins.
    async fn upsert(&self, manifest: SourceManifest, embedding: Embedding) -> Result<(), VectorIndexError>;

    /// Return up to `limit` manifests ranked by cosine similarity to `query_vector`,
    /// optionally constrained by `filter`.
    async fn search(
        &self,
        query_vector: &Embedding,
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SourceManifest>, VectorIndexError>;
}

#[derive(Serialize, Deserialize)]
struct Record {
    manifest: SourceManifest,
    embedding: Embedding,
}

/// In-process vector index backed by a `DashMap<urn, Record>`, with an optional local
/// snapshot file written after every upsert and loaded back at construction time.
pub struct InMemoryVectorIndex {
    records: DashMap<String, Record>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            snapshot_path: None,
        }
    }

    /// Load an existing snapshot (if present) and persist future upserts back to it.
    pub async fn with_snapshot_path(path: impl Into<PathBuf>) -> Result<Self, VectorIndexError> {
        let path = path.into();
        let records = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let loaded: Vec<Record> = serde_json::from_slice(&bytes)
                    .map_err(|e| VectorIndexError::StorageFault(format!("corrupt snapshot: {e}")))?;
                for record in loaded {
                    records.insert(record.manifest.urn.clone(), record);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(VectorIndexError::StorageFault(format!("failed to read snapshot: {e}"))),
        }

        Ok(Self {
            records,
            snapshot_path: Some(path),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn persist(&self) -> Result<(), VectorIndexError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let all: Vec<Record> = self
            .records
            .iter()
            .map(|entry| Record {
                manifest: entry.value().manifest.clone(),
                embedding: entry.value().embedding.clone(),
            })
            .collect();
        let snapshot = serde_json::to_vec(&all)
            .map_err(|e| VectorIndexError::StorageFault(format!("failed to serialize snapshot: {e}")))?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, snapshot)
            .await
            .map_err(|e| VectorIndexError::StorageFault(format!("failed to write snapshot: {e}")))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| VectorIndexError::StorageFault(format!("failed to finalize snapshot: {e}")))?;

        Ok(())
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, manifest: SourceManifest, embedding: Embedding) -> Result<(), VectorIndexError> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(VectorIndexError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: embedding.len(),
            });
        }

        self.records.insert(manifest.urn.clone(), Record { manifest, embedding });
        self.persist().await
    }

    async fn search(
        &self,
        query_vector: &Embedding,
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SourceManifest>, VectorIndexError> {
        if query_vector.len() != EMBEDDING_DIM {
            return Err(VectorIndexError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: query_vector.len(),
            });
        }

        let mut ranked: Vec<(f32, SourceManifest)> = self
            .records
            .iter()
            .filter(|entry| filter.map(|f| f.matches(&entry.value().manifest)).unwrap_or(true))
            .map(|entry| {
                let score = cosine_similarity(query_vector, &entry.value().embedding);
                (score, entry.value().manifest.clone())
            })
            .collect();

        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        Ok(ranked.into_iter().map(|(_, manifest)| manifest).collect())
    }
}
