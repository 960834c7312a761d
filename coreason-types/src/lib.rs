//! Shared data model for the coreason catalog federation broker.
//!
//! This crate has no business logic of its own: it defines the wire/storage shapes that
//! every other `coreason-*` crate passes around, plus the validation rules that are cheap
//! enough to check without any collaborator (embedding, storage, policy oracle, ...).

mod embedding;
mod error;
mod manifest;
mod query;
mod result;
mod user_context;

pub use embedding::{Embedding, EMBEDDING_DIM};
pub use error::ManifestError;
pub use manifest::{DataSensitivity, SourceManifest};
pub use query::{CatalogResponse, QueryRequest};
pub use result::{SourceResult, SourceStatus};
pub use user_context::{UserContext, CLAIM_IS_SERVICE_ACCOUNT};
