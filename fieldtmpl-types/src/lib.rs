//! Core identifier types for the field template engine.
//!
//! Persisted records (templates, template attributes and uniques, object
//! models, live attributes and uniques) are keyed by store-assigned integer
//! ids. Each kind gets its own newtype so a template attribute id can never
//! be passed where a live attribute id is expected.
//!
//! Sync tasks handed to the external executor are keyed by [`TaskId`]
//! (UUID v7, time-ordered).

mod ids;

pub use ids::{
    AttrId, BizId, ObjectId, TaskId, TemplateAttrId, TemplateId, TemplateUniqueId, UniqueId,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid task id: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid id `{value}`: {reason}")]
    InvalidId { value: String, reason: String },
}
