use crate::{FieldTemplateAttr, PropertyType};
use fieldtmpl_types::{AttrId, BizId, ObjectId, TemplateAttrId, TemplateUniqueId, UniqueId};
use serde::{Deserialize, Serialize};

/// An object model (a schema that live instances conform to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectModel {
    pub id: ObjectId,
    /// String key of the model, e.g. `host`.
    pub obj_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_paused: bool,
}

/// An attribute currently persisted on an object model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttribute {
    pub id: AttrId,
    pub object_id: ObjectId,
    /// Present for business-scope custom fields, absent for global attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_id: Option<BizId>,
    /// The template attribute this attribute is managed by, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateAttrId>,
    pub property_id: String,
    pub property_name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub option: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multiple: Option<bool>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub unit: String,
}

fn default_true() -> bool {
    true
}

impl ObjectAttribute {
    /// Shorthand for an unmanaged global attribute with every optional field at its default.
    pub fn new(
        id: i64,
        object_id: ObjectId,
        property_id: &str,
        property_type: PropertyType,
    ) -> Self {
        Self {
            id: AttrId::new(id),
            object_id,
            biz_id: None,
            template_id: None,
            property_id: property_id.into(),
            property_name: property_id.into(),
            property_type,
            option: None,
            is_multiple: None,
            default: None,
            required: false,
            editable: true,
            placeholder: String::new(),
            unit: String::new(),
        }
    }

    /// Builds the attribute a template attribute materializes into on `object_id`.
    /// The store assigns the real id on creation.
    pub fn from_template(object_id: ObjectId, attr: &FieldTemplateAttr) -> Self {
        Self {
            id: AttrId::new(0),
            object_id,
            biz_id: None,
            template_id: attr.id,
            property_id: attr.property_id.clone(),
            property_name: attr.property_name.clone(),
            property_type: attr.property_type,
            option: attr.option.clone(),
            is_multiple: Some(attr.is_multiple),
            default: attr.default.clone(),
            required: attr.required.value,
            editable: attr.editable.value,
            placeholder: attr.placeholder.value.clone(),
            unit: attr.unit.clone(),
        }
    }

    pub fn with_template(mut self, template_attr_id: i64) -> Self {
        self.template_id = Some(TemplateAttrId::new(template_attr_id));
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.property_name = name.into();
        self
    }

    /// Multiplicity as compared against templates; unset means single-valued.
    pub fn multiple(&self) -> bool {
        self.is_multiple.unwrap_or(false)
    }
}

/// A unique constraint currently persisted on an object model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectUnique {
    pub id: UniqueId,
    pub object_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateUniqueId>,
    /// Live attribute ids forming the composite key.
    pub keys: Vec<AttrId>,
}

/// Change to a live record's template reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "template_id")]
pub enum TemplateBinding<T> {
    /// Start tracking the given template definition.
    Bind(T),
    /// Stop tracking any template; the record becomes unmanaged.
    Unbind,
}

impl<T: Copy> TemplateBinding<T> {
    /// The template reference after applying this change.
    pub fn target(self) -> Option<T> {
        match self {
            Self::Bind(id) => Some(id),
            Self::Unbind => None,
        }
    }
}
