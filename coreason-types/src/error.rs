//! Validation errors for the shared data model.

use thiserror::Error;

/// Errors raised while validating a [`crate::SourceManifest`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("urn must begin with 'urn:', got: {0}")]
    InvalidUrnPrefix(String),

    #[error("field '{0}' is required and must be non-empty")]
    MissingField(&'static str),
}
