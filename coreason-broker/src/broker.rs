//! Orchestrates Discover -> Govern -> Dispatch -> Aggregate for one query (§4.6).

use std::sync::Arc;
use std::time::{Duration, Instant};

use coreason_dispatcher::Dispatcher;
use coreason_embedder::Embedder;
use coreason_policy::{PolicyEvaluator, PolicyInput, DEFAULT_POLICY_TIMEOUT};
use coreason_types::{CatalogResponse, SourceManifest, SourceResult, UserContext};
use coreason_vector_index::VectorIndex;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Process-wide orchestrator. Never returns an error to its caller — every failure path
/// is folded into a [`CatalogResponse`] whose provenance signature records what happened.
pub struct Broker {
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    policy_evaluator: Arc<dyn PolicyEvaluator>,
    dispatcher: Arc<dyn Dispatcher>,
    policy_timeout: Duration,
}

impl Broker {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_index: Arc<dyn VectorIndex>,
        policy_evaluator: Arc<dyn PolicyEvaluator>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            embedder,
            vector_index,
            policy_evaluator,
            dispatcher,
            policy_timeout: DEFAULT_POLICY_TIMEOUT,
        }
    }

    pub fn with_policy_timeout(mut self, timeout: Duration) -> Self {
        self.policy_timeout = timeout;
        self
    }

    pub async fn dispatch_query(&self, intent: &str, user_context: UserContext, limit: usize) -> CatalogResponse {
        let query_id = Uuid::new_v4();
        let span = info_span!("dispatch_query", %query_id);

        self.dispatch_query_inner(query_id, intent, user_context, limit)
            .instrument(span)
            .await
    }

    async fn dispatch_query_inner(
        &self,
        query_id: Uuid,
        intent: &str,
        user_context: UserContext,
        limit: usize,
    ) -> CatalogResponse {
        let embedding = match self.embedder.embed(intent) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "embedding failed during discovery");
                return CatalogResponse::discovery_failed(query_id, "ERROR: Embedding Failed");
            }
        };

        let candidates = match self.vector_index.search(&embedding, limit, None).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "vector search failed during discovery");
                return CatalogResponse::discovery_failed(query_id, "ERROR: Search Failed");
            }
        };

        let candidate_count = candidates.len();
        let allowed = self.govern(candidates, &user_context).await;
        let allowed_count = allowed.len();

        let aggregated_results = self.fan_out(allowed, intent).await;

        let partial_content =
            aggregated_results.iter().any(|r| !r.status.is_success()) || allowed_count < candidate_count;

        let provenance_signature = coreason_provenance::generate(query_id, &aggregated_results);

        CatalogResponse {
            query_id,
            aggregated_results,
            provenance_signature,
            partial_content,
        }
    }

    /// Apply the ACL gate then the policy gate, in order, to each candidate. Both gates
    /// fail closed: a policy-evaluator error drops the candidate rather than propagating.
    async fn govern(&self, candidates: Vec<SourceManifest>, user_context: &UserContext) -> Vec<SourceManifest> {
        let mut allowed = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if !coreason_policy::check_access(&candidate, user_context) {
                warn!(urn = %candidate.urn, "dropped candidate: ACL gate denied");
                continue;
            }

            let input = PolicyInput::for_query(&candidate, user_context.clone());
            match self
                .policy_evaluator
                .evaluate_policy(&candidate.access_policy, &input, self.policy_timeout)
                .await
            {
                Ok(true) => allowed.push(candidate),
                Ok(false) => {
                    warn!(urn = %candidate.urn, "dropped candidate: policy gate denied");
                }
                Err(e) => {
                    warn!(urn = %candidate.urn, error = %e, "dropped candidate: policy evaluation failed, failing closed");
                }
            }
        }

        allowed
    }

    /// Dispatch to every allowed source concurrently; per-task failures never abort
    /// siblings, and the broker waits for all of them before assembling the response.
    async fn fan_out(&self, allowed: Vec<SourceManifest>, intent: &str) -> Vec<SourceResult> {
        let intent = intent.to_string();

        let handles: Vec<(String, tokio::task::JoinHandle<SourceResult>)> = allowed
            .into_iter()
            .map(|manifest| {
                let dispatcher = self.dispatcher.clone();
                let intent = intent.clone();
                let urn = manifest.urn.clone();
                let handle = tokio::spawn(async move {
                    let start = Instant::now();
                    let outcome = dispatcher.dispatch(&manifest, &intent).await;
                    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

                    match outcome {
                        Ok(payloads) => SourceResult::success(manifest.urn.clone(), serde_json::json!(payloads), latency_ms),
                        Err(e) => {
                            warn!(urn = %manifest.urn, error = %e, "dispatch failed");
                            SourceResult::error(manifest.urn.clone(), e, latency_ms)
                        }
                    }
                });
                (urn, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (urn, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_err) => {
                    warn!(urn = %urn, error = %join_err, "dispatch task panicked");
                    results.push(SourceResult::error(urn, join_err, 0.0));
                }
            }
        }

        info!(dispatched = results.len(), "fan-out complete");
        results
    }
}
