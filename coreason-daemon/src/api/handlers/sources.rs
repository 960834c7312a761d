//! `POST /v1/sources` (§4.4, §6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use coreason_types::SourceManifest;
use serde_json::{json, Value};
use tracing::{info_span, Instrument};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn register_source(
    State(state): State<AppState>,
    Json(manifest): Json<SourceManifest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let urn = manifest.urn.clone();
    let span = info_span!("register_source", urn = %urn);

    async move {
        let registry = state.services.registry().await.map_err(ApiError::from)?;
        registry.register(manifest).await.map_err(ApiError::from)?;
        Ok((
            StatusCode::CREATED,
            Json(json!({ "status": "registered", "urn": urn })),
        ))
    }
    .instrument(span)
    .await
}
