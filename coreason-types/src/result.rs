//! A single source's outcome within an aggregated [`crate::CatalogResponse`].

use serde::{Deserialize, Serialize};

/// Outcome of dispatching to one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
    /// Never produced by the default broker path; reserved for the debug mode described
    /// in the design notes, where silently-dropped candidates are surfaced for inspection.
    #[serde(rename = "BLOCKED_BY_POLICY")]
    BlockedByPolicy,
    #[serde(rename = "PARTIAL_CONTENT")]
    PartialContent,
}

impl SourceStatus {
    pub fn is_success(self) -> bool {
        matches!(self, SourceStatus::Success)
    }
}

/// One source's outcome. `latency_ms` is measured from the moment dispatch begins for
/// that source to the moment its outcome is finalized, in wall-clock milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    pub source_urn: String,
    pub status: SourceStatus,
    pub data: serde_json::Value,
    pub latency_ms: f64,
}

impl SourceResult {
    pub fn success(source_urn: impl Into<String>, data: serde_json::Value, latency_ms: f64) -> Self {
        Self {
            source_urn: source_urn.into(),
            status: SourceStatus::Success,
            data,
            latency_ms,
        }
    }

    pub fn error(source_urn: impl Into<String>, reason: impl std::fmt::Display, latency_ms: f64) -> Self {
        Self {
            source_urn: source_urn.into(),
            status: SourceStatus::Error,
            data: serde_json::json!({ "error": reason.to_string() }),
            latency_ms,
        }
    }

    pub fn blocked_by_policy(source_urn: impl Into<String>) -> Self {
        Self {
            source_urn: source_urn.into(),
            status: SourceStatus::BlockedByPolicy,
            data: serde_json::Value::Null,
            latency_ms: 0.0,
        }
    }
}
