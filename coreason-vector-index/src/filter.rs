//! Structured filter applied alongside vector similarity ranking.

use coreason_types::DataSensitivity;

/// Optional constraints over a [`coreason_types::SourceManifest`]'s scalar attributes.
/// All populated fields must match (logical AND); `None` fields are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub geo_location: Option<String>,
    pub sensitivity: Option<DataSensitivity>,
    pub owner_group: Option<String>,
}

impl SearchFilter {
    pub fn matches(&self, manifest: &coreason_types::SourceManifest) -> bool {
        if let Some(geo) = &self.geo_location {
            if &manifest.geo_location != geo {
                return false;
            }
        }
        if let Some(sensitivity) = &self.sensitivity {
            if &manifest.sensitivity != sensitivity {
                return false;
            }
        }
        if let Some(owner) = &self.owner_group {
            if &manifest.owner_group != owner {
                return false;
            }
        }
        true
    }
}
