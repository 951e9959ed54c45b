//! Error types for the comparison core.

use crate::ConflictField;
use fieldtmpl_model::PropertyType;
use fieldtmpl_types::{AttrId, TemplateAttrId, TemplateUniqueId, UniqueId};
use thiserror::Error;

/// Result type for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors raised while normalizing a template or comparing in backend mode.
#[derive(Debug, Error)]
pub enum CompareError {
    /// Attribute definition is malformed on its own.
    #[error("invalid template attribute `{property_id}`: {reason}")]
    InvalidAttr { property_id: String, reason: String },

    /// Property id starts with the prefix reserved for built-in attributes.
    #[error("template attribute `{property_id}` uses reserved prefix `{prefix}`")]
    ReservedPrefix { property_id: String, prefix: String },

    /// Property id redefines an internal field.
    #[error("template attribute `{0}` collides with an internal field")]
    ReservedField(String),

    /// Two template attributes share a property id.
    #[error("duplicate template property id `{0}`")]
    DuplicatePropertyId(String),

    /// Two template attributes share a property name.
    #[error("duplicate template property name `{0}`")]
    DuplicatePropertyName(String),

    /// Two template attributes share a persisted id.
    #[error("duplicate template attribute id {0}")]
    DuplicateAttrId(TemplateAttrId),

    /// A template unique has no keys.
    #[error("template unique #{index} has no keys")]
    EmptyUniqueKeys { index: usize },

    /// A template unique lists the same key twice.
    #[error("template unique #{index} repeats key `{key}`")]
    DuplicateUniqueKey { index: usize, key: String },

    /// Two template uniques share a persisted id.
    #[error("duplicate template unique id {0}")]
    DuplicateUniqueId(TemplateUniqueId),

    /// Two template uniques are equal or one's keys contain the other's.
    #[error("template uniques `{first}` and `{second}` overlap")]
    AmbiguousUniques { first: String, second: String },

    /// A unique key names no attribute of the template.
    #[error("unique key `{0}` is not a template attribute")]
    UnknownUniqueKey(String),

    /// A unique key's attribute type cannot back a unique constraint.
    #[error("unique key `{key}` has type {property_type}, which cannot be unique")]
    InvalidUniqueKeyType {
        key: String,
        property_type: PropertyType,
    },

    /// Live attribute cannot be unambiguously matched (backend mode only).
    #[error("attribute {attr_id} conflicts with template attribute `{property_id}` on {field}")]
    AttrConflict {
        attr_id: AttrId,
        field: ConflictField,
        property_id: String,
    },

    /// Live unique overlaps a template unique (backend mode only).
    #[error("unique {unique_id} conflicts with template unique `{key}`")]
    UniqueConflict { unique_id: UniqueId, key: String },
}
