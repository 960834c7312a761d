//! `POST /v1/query` (§4.6, §6). The `X-User-Context` header, when present and parseable as
//! a `UserContext` JSON document, overrides the body's `user_context`; on parse failure the
//! body value is retained and a warning is logged.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use coreason_types::{CatalogResponse, QueryRequest, UserContext};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const USER_CONTEXT_HEADER: &str = "x-user-context";

pub async fn run_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<QueryRequest>,
) -> ApiResult<Json<CatalogResponse>> {
    if let Some(raw) = headers.get(USER_CONTEXT_HEADER) {
        match raw
            .to_str()
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<UserContext>(s).map_err(|e| e.to_string()))
        {
            Ok(user_context) => request.user_context = user_context,
            Err(e) => warn!(error = %e, "failed to parse X-User-Context header, retaining body value"),
        }
    }

    let limit = request.limit.unwrap_or_else(|| state.services.default_limit());

    let broker = state.services.broker().await.map_err(ApiError::from)?;
    let response = broker
        .dispatch_query(&request.intent, request.user_context, limit)
        .await;

    Ok(Json(response))
}
