//! Validates, embeds, and upserts source manifests (§4.4).

use std::sync::Arc;

use coreason_embedder::Embedder;
use coreason_types::{SourceManifest, EMBEDDING_DIM};
use coreason_vector_index::VectorIndex;
use tracing::info;

use crate::error::RegistryError;

/// Registers [`SourceManifest`]s against an [`Embedder`] and a [`VectorIndex`].
pub struct Registry {
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
}

impl Registry {
    pub fn new(embedder: Arc<dyn Embedder>, vector_index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            vector_index,
        }
    }

    /// Validate, embed, and upsert `manifest`. Re-registering an existing URN replaces it.
    pub async fn register(&self, manifest: SourceManifest) -> Result<(), RegistryError> {
        manifest.validate()?;

        let embedding = self.embedder.embed(&manifest.description)?;
        if embedding.len() != EMBEDDING_DIM {
            return Err(RegistryError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: embedding.len(),
            });
        }

        let urn = manifest.urn.clone();
        self.vector_index.upsert(manifest, embedding).await?;
        info!(urn = %urn, "registered source manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coreason_embedder::test_util::FailingEmbedder;
    use coreason_embedder::HashEmbedder;
    use coreason_vector_index::InMemoryVectorIndex;
    use std::collections::BTreeSet;

    fn manifest(urn: &str) -> SourceManifest {
        SourceManifest {
            urn: urn.to_string(),
            name: "test source".into(),
            description: "clinical trial records for US patients".into(),
            endpoint_url: "sse://example.invalid:1".into(),
            source_pointer: None,
            acls: BTreeSet::new(),
            geo_location: "US".into(),
            sensitivity: coreason_types::DataSensitivity::Public,
            owner_group: "team".into(),
            access_policy: "package match\nallow { true }".into(),
        }
    }

    #[tokio::test]
    async fn registers_valid_manifest() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Registry::new(Arc::new(HashEmbedder::new()), index.clone());
        registry
            .register(manifest("urn:coreason:mcp:test"))
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_manifest_without_touching_index() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Registry::new(Arc::new(HashEmbedder::new()), index.clone());
        let mut bad = manifest("not-a-urn");
        bad.urn = "not-a-urn".to_string();
        let err = registry.register(bad).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidManifest(_)));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn surfaces_embedding_failure() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Registry::new(Arc::new(FailingEmbedder), index.clone());
        let err = registry
            .register(manifest("urn:coreason:mcp:test"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmbeddingFailed(_)));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn reregistering_same_urn_upserts() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Registry::new(Arc::new(HashEmbedder::new()), index.clone());
        registry
            .register(manifest("urn:coreason:mcp:test"))
            .await
            .unwrap();
        let mut updated = manifest("urn:coreason:mcp:test");
        updated.name = "renamed".into();
        registry.register(updated).await.unwrap();
        assert_eq!(index.len(), 1);
    }
}
