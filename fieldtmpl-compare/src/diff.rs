//! Result types produced by the comparators.

use fieldtmpl_model::{FieldTemplateAttr, ObjectAttribute, ObjectUnique, TemplateBinding};
use fieldtmpl_types::{ObjectId, TemplateAttrId, TemplateUniqueId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which identity field made a live attribute ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictField {
    PropertyId,
    PropertyName,
    PropertyType,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PropertyId => "property_id",
            Self::PropertyName => "property_name",
            Self::PropertyType => "property_type",
        })
    }
}

/// Field-level changes needed to bring a live attribute in line with its template.
///
/// `None` means "leave as is". For `option` and `default` a JSON `null`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateBinding<TemplateAttrId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multiple: Option<bool>,
}

impl AttrPatch {
    /// Diffs a matched pair. Locked fields are only compared when locked.
    ///
    /// With `bind` set, an attribute not yet tracking `tmpl` is bound to it.
    pub fn between(tmpl: &FieldTemplateAttr, attr: &ObjectAttribute, bind: bool) -> Self {
        let template_id = match tmpl.id {
            Some(id) if bind && attr.template_id != Some(id) => Some(TemplateBinding::Bind(id)),
            _ => None,
        };

        Self {
            template_id,
            property_name: (tmpl.property_name != attr.property_name)
                .then(|| tmpl.property_name.clone()),
            unit: (tmpl.unit != attr.unit).then(|| tmpl.unit.clone()),
            placeholder: tmpl.placeholder.enforced(&attr.placeholder),
            editable: tmpl.editable.enforced(&attr.editable),
            required: tmpl.required.enforced(&attr.required),
            option: (tmpl.option != attr.option)
                .then(|| tmpl.option.clone().unwrap_or(serde_json::Value::Null)),
            default: (tmpl.default != attr.default)
                .then(|| tmpl.default.clone().unwrap_or(serde_json::Value::Null)),
            is_multiple: (tmpl.is_multiple != attr.multiple()).then_some(tmpl.is_multiple),
        }
    }

    /// Patch that turns the attribute into an unmanaged one.
    pub fn unbind() -> Self {
        Self {
            template_id: Some(TemplateBinding::Unbind),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the fields this patch touches, in a fixed order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.template_id.is_some() {
            fields.push("template_id");
        }
        if self.property_name.is_some() {
            fields.push("property_name");
        }
        if self.unit.is_some() {
            fields.push("unit");
        }
        if self.placeholder.is_some() {
            fields.push("placeholder");
        }
        if self.editable.is_some() {
            fields.push("editable");
        }
        if self.required.is_some() {
            fields.push("required");
        }
        if self.option.is_some() {
            fields.push("option");
        }
        if self.default.is_some() {
            fields.push("default");
        }
        if self.is_multiple.is_some() {
            fields.push("is_multiple");
        }
        fields
    }

    /// Applies the patch to a copy of `attr`.
    pub fn apply(&self, attr: &ObjectAttribute) -> ObjectAttribute {
        let mut out = attr.clone();
        if let Some(binding) = self.template_id {
            out.template_id = binding.target();
        }
        if let Some(v) = &self.property_name {
            out.property_name = v.clone();
        }
        if let Some(v) = &self.unit {
            out.unit = v.clone();
        }
        if let Some(v) = &self.placeholder {
            out.placeholder = v.clone();
        }
        if let Some(v) = self.editable {
            out.editable = v;
        }
        if let Some(v) = self.required {
            out.required = v;
        }
        if let Some(v) = &self.option {
            out.option = (!v.is_null()).then(|| v.clone());
        }
        if let Some(v) = &self.default {
            out.default = (!v.is_null()).then(|| v.clone());
        }
        if let Some(v) = self.is_multiple {
            out.is_multiple = Some(v);
        }
        out
    }
}

// ── Attributes ───────────────────────────────────────────────────

/// Template attribute with no live counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrCreate {
    /// Position in the template's attribute list.
    pub index: usize,
    pub property_id: String,
}

/// Live attribute that must change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrUpdate {
    /// Position of the matching template attribute; absent when the
    /// attribute's template was deleted and it is being detached.
    pub index: Option<usize>,
    pub property_id: String,
    pub attr: ObjectAttribute,
    pub patch: AttrPatch,
}

/// Live attribute that cannot be unambiguously matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrConflict {
    /// Position of the template attribute it collides with.
    pub index: usize,
    pub property_id: String,
    pub field: ConflictField,
    pub message: String,
    pub attr: ObjectAttribute,
}

/// Live attribute needing no change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrUnchanged {
    /// Position of the matching template attribute, if it has one.
    pub index: Option<usize>,
    pub attr: ObjectAttribute,
}

/// Detailed attribute comparison for review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrDiff {
    pub create: Vec<AttrCreate>,
    pub update: Vec<AttrUpdate>,
    pub conflict: Vec<AttrConflict>,
    pub unchanged: Vec<AttrUnchanged>,
}

/// Attribute changes to apply during unattended sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrSyncPlan {
    pub create: Vec<AttrCreate>,
    pub update: Vec<AttrUpdate>,
}

impl AttrSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }
}

// ── Uniques ──────────────────────────────────────────────────────

/// Template unique with no live counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueCreate {
    pub index: usize,
    /// Property ids, sorted.
    pub keys: Vec<String>,
}

/// Live unique that must change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueUpdate {
    /// Position of the matching template unique; absent when detaching.
    pub index: Option<usize>,
    pub unique: ObjectUnique,
    /// Property ids the unique must consist of after the update.
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateBinding<TemplateUniqueId>>,
}

/// Live unique that overlaps a template unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConflict {
    pub index: usize,
    /// Canonical key of the template unique it overlaps.
    pub key: String,
    pub message: String,
    pub unique: ObjectUnique,
}

/// Live unique needing no change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueUnchanged {
    pub index: Option<usize>,
    pub unique: ObjectUnique,
}

/// Detailed unique comparison for review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueDiff {
    pub create: Vec<UniqueCreate>,
    pub update: Vec<UniqueUpdate>,
    pub conflict: Vec<UniqueConflict>,
    pub unchanged: Vec<UniqueUnchanged>,
}

/// Unique changes to apply during unattended sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueSyncPlan {
    pub create: Vec<UniqueCreate>,
    pub update: Vec<UniqueUpdate>,
}

impl UniqueSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }
}

/// Verdict of a partial comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub object_id: ObjectId,
    pub need_sync: bool,
}
