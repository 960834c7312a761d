//! The registered description of a federated source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Governance sensitivity classification for a source's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSensitivity {
    #[serde(rename = "PUBLIC")]
    Public,
    #[serde(rename = "INTERNAL")]
    Internal,
    #[serde(rename = "PII")]
    Pii,
    #[serde(rename = "GxP_LOCKED")]
    GxpLocked,
}

/// The registered description of a federated MCP source.
///
/// Re-registering the same `urn` replaces the prior record (upsert) — see
/// [`crate::error::ManifestError`] for the shapes `Registry::register` can reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceManifest {
    pub urn: String,
    pub name: String,
    /// Text used for semantic indexing.
    pub description: String,
    /// `sse://` or `sses://` prefixed; rewritten to `http(s)://` by the dispatcher.
    pub endpoint_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_pointer: Option<serde_json::Value>,
    /// Group identifiers granted access. Empty means no group grants access.
    #[serde(default)]
    pub acls: BTreeSet<String>,
    pub geo_location: String,
    pub sensitivity: DataSensitivity,
    pub owner_group: String,
    /// Embedded policy program text (evaluated by the policy gate).
    pub access_policy: String,
}

impl SourceManifest {
    /// Validate required fields per §4.4 step 1. `acls` is allowed to be empty — that is a
    /// governance decision (deny-all-by-default), not a validation failure.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if !self.urn.starts_with("urn:") {
            return Err(ManifestError::InvalidUrnPrefix(self.urn.clone()));
        }
        if self.name.trim().is_empty() {
            return Err(ManifestError::MissingField("name"));
        }
        if self.description.trim().is_empty() {
            return Err(ManifestError::MissingField("description"));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(ManifestError::MissingField("endpoint_url"));
        }
        if self.geo_location.trim().is_empty() {
            return Err(ManifestError::MissingField("geo_location"));
        }
        if self.owner_group.trim().is_empty() {
            return Err(ManifestError::MissingField("owner_group"));
        }
        if self.access_policy.trim().is_empty() {
            return Err(ManifestError::MissingField("access_policy"));
        }
        Ok(())
    }
}
