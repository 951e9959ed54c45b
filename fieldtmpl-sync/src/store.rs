//! Collaborator interfaces.
//!
//! The engine only reads templates and live schemas. Every write goes
//! through the [`TaskExecutor`], outside of comparison.

use crate::error::SyncResult;
use async_trait::async_trait;
use fieldtmpl_compare::AttrUpdate;
use fieldtmpl_model::{
    FieldTemplate, FieldTemplateAttr, FieldTemplateUnique, ObjectAttribute, ObjectModel,
    ObjectUnique, TemplateObjectBinding,
};
use fieldtmpl_types::{AttrId, ObjectId, TaskId, TemplateAttrId, TemplateId, TemplateUniqueId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which side of the template/object relation to list bindings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingFilter {
    Template(TemplateId),
    Object(ObjectId),
}

impl BindingFilter {
    pub fn matches(&self, binding: &TemplateObjectBinding) -> bool {
        match *self {
            Self::Template(id) => binding.template_id == id,
            Self::Object(id) => binding.object_id == id,
        }
    }
}

/// Attribute scope: global attributes belong to the model itself, business
/// attributes are custom fields owned by one business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrScope {
    #[default]
    Global,
    Business,
    Any,
}

/// Selects live attributes of one object.
///
/// `ids` must match when set. `property_ids` and `property_names` are
/// alternatives: an attribute matching either list is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrFilter {
    pub scope: AttrScope,
    pub ids: Option<Vec<AttrId>>,
    pub property_ids: Option<Vec<String>>,
    pub property_names: Option<Vec<String>>,
}

impl AttrFilter {
    /// All global attributes.
    pub fn global() -> Self {
        Self::default()
    }

    pub fn scope(scope: AttrScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn with_ids(mut self, ids: Vec<AttrId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_property_ids(mut self, property_ids: Vec<String>) -> Self {
        self.property_ids = Some(property_ids);
        self
    }

    pub fn with_property_names(mut self, names: Vec<String>) -> Self {
        self.property_names = Some(names);
        self
    }

    pub fn matches(&self, attr: &ObjectAttribute) -> bool {
        let in_scope = match self.scope {
            AttrScope::Global => attr.biz_id.is_none(),
            AttrScope::Business => attr.biz_id.is_some(),
            AttrScope::Any => true,
        };
        if !in_scope {
            return false;
        }
        if let Some(ids) = &self.ids
            && !ids.contains(&attr.id)
        {
            return false;
        }

        let by_id = self.property_ids.as_ref();
        let by_name = self.property_names.as_ref();
        if by_id.is_none() && by_name.is_none() {
            return true;
        }
        by_id.is_some_and(|ids| ids.contains(&attr.property_id))
            || by_name.is_some_and(|names| names.contains(&attr.property_name))
    }
}

/// Attribute changes for one object, handed to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: TaskId,
    pub template_id: TemplateId,
    pub object_id: ObjectId,
    /// Attributes to create, already bound to their template attribute.
    pub create: Vec<ObjectAttribute>,
    pub update: Vec<AttrUpdate>,
}

/// Read access to templates and their bindings.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, id: TemplateId) -> SyncResult<Option<FieldTemplate>>;

    /// Attributes of a template, in template order.
    async fn list_template_attrs(&self, id: TemplateId) -> SyncResult<Vec<FieldTemplateAttr>>;

    /// Uniques of a template, in template order.
    async fn list_template_uniques(
        &self,
        id: TemplateId,
    ) -> SyncResult<Vec<FieldTemplateUnique>>;

    async fn list_bindings(
        &self,
        filter: BindingFilter,
    ) -> SyncResult<Vec<TemplateObjectBinding>>;

    /// Owning template of each known template attribute id. Unknown ids are omitted.
    async fn attr_owners(
        &self,
        ids: &[TemplateAttrId],
    ) -> SyncResult<HashMap<TemplateAttrId, TemplateId>>;

    /// Owning template of each known template unique id. Unknown ids are omitted.
    async fn unique_owners(
        &self,
        ids: &[TemplateUniqueId],
    ) -> SyncResult<HashMap<TemplateUniqueId, TemplateId>>;
}

/// Read access to live object schemas.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn get_object(&self, id: ObjectId) -> SyncResult<Option<ObjectModel>>;

    async fn read_model_attrs(
        &self,
        object_id: ObjectId,
        filter: &AttrFilter,
    ) -> SyncResult<Vec<ObjectAttribute>>;

    async fn read_model_uniques(&self, object_id: ObjectId) -> SyncResult<Vec<ObjectUnique>>;
}

/// Applies computed changes asynchronously.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn enqueue_sync(&self, task: SyncTask) -> SyncResult<TaskId>;
}
