//! Lazily constructed, process-wide singletons (§4.9), wired the way
//! `coreason_catalog.dependencies`'s thread-safe singleton cache did: first caller
//! constructs, concurrent first-callers see exactly one construction, and a failed
//! construction is never cached so a later call can retry.

use std::sync::Arc;

use coreason_broker::Broker;
use coreason_dispatcher::{Dispatcher, HttpSseDispatcher};
use coreason_embedder::{Embedder, HashEmbedder};
use coreason_policy::{OpaPolicyEvaluator, PolicyEvaluator};
use coreason_registry::Registry;
use coreason_vector_index::{InMemoryVectorIndex, VectorIndex, VectorIndexError};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::Config;

/// Failure constructing one of the process-wide singletons.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("vector index unavailable: {0}")]
    VectorIndex(#[from] VectorIndexError),
    #[error("dispatcher transport unavailable: {0}")]
    Dispatcher(#[from] coreason_dispatcher::DispatchError),
}

/// Holds one lazily-built instance of each backend trait, plus the `Registry`/`Broker`
/// facades built over them. `Embedder` and `PolicyEvaluator` construction is currently
/// infallible, so those two cells use `get_or_init`; `VectorIndex` (snapshot I/O) and
/// `Dispatcher` (client construction) can fail, so those use `get_or_try_init` and are
/// retried on a later call if the first attempt errored.
pub struct Services {
    config: Config,
    embedder: OnceCell<Arc<dyn Embedder>>,
    vector_index: OnceCell<Arc<dyn VectorIndex>>,
    policy_evaluator: OnceCell<Arc<dyn PolicyEvaluator>>,
    dispatcher: OnceCell<Arc<dyn Dispatcher>>,
}

impl Services {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            embedder: OnceCell::new(),
            vector_index: OnceCell::new(),
            policy_evaluator: OnceCell::new(),
            dispatcher: OnceCell::new(),
        }
    }

    async fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder
            .get_or_init(|| async { Arc::new(HashEmbedder::new()) as Arc<dyn Embedder> })
            .await
            .clone()
    }

    async fn vector_index(&self) -> Result<Arc<dyn VectorIndex>, VectorIndexError> {
        self.vector_index
            .get_or_try_init(|| async {
                let index: Arc<dyn VectorIndex> = match &self.config.vector_index_path {
                    Some(path) => Arc::new(InMemoryVectorIndex::with_snapshot_path(path).await?),
                    None => Arc::new(InMemoryVectorIndex::new()),
                };
                Ok(index)
            })
            .await
            .cloned()
    }

    async fn policy_evaluator(&self) -> Arc<dyn PolicyEvaluator> {
        self.policy_evaluator
            .get_or_init(|| async {
                let evaluator = match &self.config.opa_path {
                    Some(path) => OpaPolicyEvaluator::with_path(path.clone()),
                    None => OpaPolicyEvaluator::discover(),
                };
                Arc::new(evaluator) as Arc<dyn PolicyEvaluator>
            })
            .await
            .clone()
    }

    async fn dispatcher(&self) -> Result<Arc<dyn Dispatcher>, coreason_dispatcher::DispatchError> {
        self.dispatcher
            .get_or_try_init(|| async {
                let timeout = std::time::Duration::from_secs(self.config.dispatch_timeout_secs);
                let dispatcher = HttpSseDispatcher::new(timeout)?;
                Ok(Arc::new(dispatcher) as Arc<dyn Dispatcher>)
            })
            .await
            .cloned()
    }

    pub async fn registry(&self) -> Result<Registry, ServiceError> {
        let vector_index = self.vector_index().await?;
        Ok(Registry::new(self.embedder().await, vector_index))
    }

    pub async fn broker(&self) -> Result<Broker, ServiceError> {
        let vector_index = self.vector_index().await?;
        let dispatcher = self.dispatcher().await?;
        let policy_timeout = std::time::Duration::from_secs(self.config.policy_timeout_secs);

        Ok(Broker::new(
            self.embedder().await,
            vector_index,
            self.policy_evaluator().await,
            dispatcher,
        )
        .with_policy_timeout(policy_timeout))
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }
}
