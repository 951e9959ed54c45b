use crate::{Lockable, PropertyType};
use fieldtmpl_types::{ObjectId, TemplateAttrId, TemplateId, TemplateUniqueId};
use serde::{Deserialize, Serialize};

/// Maximum length of a property id or property name.
pub const MAX_PROPERTY_LEN: usize = 128;

/// A reusable schema of attributes and unique constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The template's canonical definition of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplateAttr {
    /// Absent while the attribute is only part of an unsaved template edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateAttrId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    pub property_id: String,
    pub property_name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub option: Option<serde_json::Value>,
    #[serde(default)]
    pub is_multiple: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub required: Lockable<bool>,
    #[serde(default = "editable_by_default")]
    pub editable: Lockable<bool>,
    #[serde(default)]
    pub placeholder: Lockable<String>,
}

fn editable_by_default() -> Lockable<bool> {
    Lockable::unlocked(true)
}

impl FieldTemplateAttr {
    /// Shorthand for an unsaved attribute with every optional field at its default.
    pub fn new(property_id: &str, property_name: &str, property_type: PropertyType) -> Self {
        Self {
            id: None,
            template_id: None,
            property_id: property_id.into(),
            property_name: property_name.into(),
            property_type,
            option: None,
            is_multiple: false,
            default: None,
            unit: String::new(),
            required: Lockable::unlocked(false),
            editable: editable_by_default(),
            placeholder: Lockable::unlocked(String::new()),
        }
    }

    /// Sets the persisted id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(TemplateAttrId::new(id));
        self
    }

    /// Checks the shape of the attribute definition in isolation.
    /// Return `Err(message)` describes the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        let id = &self.property_id;
        if id.is_empty() {
            return Err("property id is empty".into());
        }
        if id.chars().count() > MAX_PROPERTY_LEN {
            return Err(format!("property id exceeds {MAX_PROPERTY_LEN} characters"));
        }
        if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err("property id must start with a letter".into());
        }
        if let Some(bad) = id.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(format!("property id contains invalid character `{bad}`"));
        }

        let name = self.property_name.trim();
        if name.is_empty() {
            return Err("property name is empty".into());
        }
        if name.chars().count() > MAX_PROPERTY_LEN {
            return Err(format!("property name exceeds {MAX_PROPERTY_LEN} characters"));
        }
        Ok(())
    }
}

/// A template unique constraint as stored: keys are template attribute ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplateUnique {
    pub id: TemplateUniqueId,
    pub template_id: TemplateId,
    pub keys: Vec<TemplateAttrId>,
}

/// A template unique constraint prepared for comparison: keys are property ids.
///
/// `id` is absent for uniques that only exist in an unsaved template edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateUniqueKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateUniqueId>,
    pub keys: Vec<String>,
}

impl TemplateUniqueKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(TemplateUniqueId::new(id));
        self
    }
}

/// Many-to-many relation between templates and object models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateObjectBinding {
    pub template_id: TemplateId,
    pub object_id: ObjectId,
}
