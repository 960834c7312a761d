//! Request/response envelopes for the `/v1/query` flow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::SourceResult;
use crate::user_context::UserContext;

/// HTTP request body for `POST /v1/query`. `limit` is `None` when the caller omits it —
/// callers that need a concrete value (the HTTP shell) fall back to their own configured
/// default rather than a value baked into this type, so a single process-wide default query
/// limit knob stays meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub intent: String,
    #[serde(default)]
    pub user_context: UserContext,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// The aggregate result of one `dispatch_query` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub query_id: Uuid,
    /// Order is the order in which sources completed; not a required property.
    pub aggregated_results: Vec<SourceResult>,
    pub provenance_signature: String,
    /// True iff any included result has status != SUCCESS, or at least one candidate was
    /// dropped by governance.
    pub partial_content: bool,
}

impl CatalogResponse {
    /// Build an empty response whose provenance signature is a literal error marker — used
    /// when discovery itself fails (embedding or vector search), before any candidate exists.
    pub fn discovery_failed(query_id: Uuid, reason: &str) -> Self {
        Self {
            query_id,
            aggregated_results: Vec::new(),
            provenance_signature: reason.to_string(),
            partial_content: false,
        }
    }
}
