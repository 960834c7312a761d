//! HTTP-facing error mapping for the daemon's REST surface (§4.8, §6).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coreason_registry::RegistryError;
use serde::Serialize;
use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidManifest(msg) => ApiError::InvalidManifest(msg.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::InvalidManifest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_MANIFEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorBody {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
