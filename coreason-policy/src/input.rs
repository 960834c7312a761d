//! The structured `subject`/`object`/`action` input handed to the policy oracle.

use coreason_types::{DataSensitivity, SourceManifest, UserContext};
use serde::Serialize;

/// The subject/object/action triple the external policy program is evaluated against.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyInput {
    pub subject: UserContext,
    pub object: PolicyObject,
    pub action: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyObject {
    pub urn: String,
    pub geo: String,
    pub sensitivity: DataSensitivity,
    pub owner: String,
}

impl PolicyInput {
    /// Build the `"QUERY"` action input for a candidate source, per §4.6 step 3.
    pub fn for_query(manifest: &SourceManifest, subject: UserContext) -> Self {
        Self {
            subject,
            object: PolicyObject {
                urn: manifest.urn.clone(),
                geo: manifest.geo_location.clone(),
                sensitivity: manifest.sensitivity,
                owner: manifest.owner_group.clone(),
            },
            action: "QUERY",
        }
    }
}
