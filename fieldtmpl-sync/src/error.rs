//! Error types for the sync layer.

use fieldtmpl_compare::CompareError;
use fieldtmpl_types::{BizId, ObjectId, TemplateId};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while planning or checking template sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Template is malformed, or backend comparison hit a conflict.
    #[error(transparent)]
    Compare(#[from] CompareError),

    /// Store backend failure.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// Object is not bound to the template.
    #[error("object {object_id} is not bound to template {template_id}")]
    NotBound {
        template_id: TemplateId,
        object_id: ObjectId,
    },

    /// Paused objects accept no schema changes.
    #[error("object {0} is paused")]
    ObjectPaused(ObjectId),

    /// Template defines no attributes; there is nothing to sync against.
    #[error("template {0} has no attributes")]
    EmptyTemplate(TemplateId),

    /// A unique key refers to an attribute that cannot be found.
    #[error("unique key refers to missing attribute `{0}`")]
    MissingAttribute(String),

    /// Template attribute collides with a business-scope custom field.
    #[error("attribute `{property_id}` is already defined by business {biz_id}")]
    ScopeCollision { biz_id: BizId, property_id: String },

    /// A status worker panicked or was aborted.
    #[error("worker failed: {0}")]
    Worker(String),
}
