//! In-memory store backed by a JSON snapshot.
//!
//! Implements every collaborator trait, so one instance can back a whole
//! [`FieldTemplateService`](crate::FieldTemplateService). Enqueued tasks are
//! recorded instead of executed.

use crate::error::{SyncError, SyncResult};
use crate::store::{AttrFilter, BindingFilter, ModelStore, SyncTask, TaskExecutor, TemplateStore};
use async_trait::async_trait;
use fieldtmpl_model::{
    FieldTemplate, FieldTemplateAttr, FieldTemplateUnique, ObjectAttribute, ObjectModel,
    ObjectUnique, TemplateObjectBinding,
};
use fieldtmpl_types::{ObjectId, TaskId, TemplateAttrId, TemplateId, TemplateUniqueId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

/// Everything the engine reads, as flat tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub templates: Vec<FieldTemplate>,
    /// Template attributes of all templates; each carries its `template_id`.
    pub template_attrs: Vec<FieldTemplateAttr>,
    pub template_uniques: Vec<FieldTemplateUnique>,
    pub bindings: Vec<TemplateObjectBinding>,
    pub objects: Vec<ObjectModel>,
    pub attrs: Vec<ObjectAttribute>,
    pub uniques: Vec<ObjectUnique>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Store(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

/// Reference store holding a [`Snapshot`] behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Snapshot>,
    tasks: RwLock<Vec<SyncTask>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.data.read().await.clone()
    }

    /// Replaces the contents, e.g. after the executor has applied a task.
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.data.write().await = snapshot;
    }

    /// Tasks enqueued so far, oldest first.
    pub async fn tasks(&self) -> Vec<SyncTask> {
        self.tasks.read().await.clone()
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_template(&self, id: TemplateId) -> SyncResult<Option<FieldTemplate>> {
        let data = self.data.read().await;
        Ok(data.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn list_template_attrs(&self, id: TemplateId) -> SyncResult<Vec<FieldTemplateAttr>> {
        let data = self.data.read().await;
        Ok(data
            .template_attrs
            .iter()
            .filter(|a| a.template_id == Some(id))
            .cloned()
            .collect())
    }

    async fn list_template_uniques(
        &self,
        id: TemplateId,
    ) -> SyncResult<Vec<FieldTemplateUnique>> {
        let data = self.data.read().await;
        Ok(data
            .template_uniques
            .iter()
            .filter(|u| u.template_id == id)
            .cloned()
            .collect())
    }

    async fn list_bindings(
        &self,
        filter: BindingFilter,
    ) -> SyncResult<Vec<TemplateObjectBinding>> {
        let data = self.data.read().await;
        Ok(data
            .bindings
            .iter()
            .filter(|b| filter.matches(b))
            .copied()
            .collect())
    }

    async fn attr_owners(
        &self,
        ids: &[TemplateAttrId],
    ) -> SyncResult<HashMap<TemplateAttrId, TemplateId>> {
        let data = self.data.read().await;
        Ok(data
            .template_attrs
            .iter()
            .filter_map(|a| Some((a.id?, a.template_id?)))
            .filter(|(id, _)| ids.contains(id))
            .collect())
    }

    async fn unique_owners(
        &self,
        ids: &[TemplateUniqueId],
    ) -> SyncResult<HashMap<TemplateUniqueId, TemplateId>> {
        let data = self.data.read().await;
        Ok(data
            .template_uniques
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| (u.id, u.template_id))
            .collect())
    }
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn get_object(&self, id: ObjectId) -> SyncResult<Option<ObjectModel>> {
        let data = self.data.read().await;
        Ok(data.objects.iter().find(|o| o.id == id).cloned())
    }

    async fn read_model_attrs(
        &self,
        object_id: ObjectId,
        filter: &AttrFilter,
    ) -> SyncResult<Vec<ObjectAttribute>> {
        let data = self.data.read().await;
        Ok(data
            .attrs
            .iter()
            .filter(|a| a.object_id == object_id && filter.matches(a))
            .cloned()
            .collect())
    }

    async fn read_model_uniques(&self, object_id: ObjectId) -> SyncResult<Vec<ObjectUnique>> {
        let data = self.data.read().await;
        Ok(data
            .uniques
            .iter()
            .filter(|u| u.object_id == object_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskExecutor for MemoryStore {
    async fn enqueue_sync(&self, task: SyncTask) -> SyncResult<TaskId> {
        let id = task.id;
        debug!("recorded sync task {} for object {}", id, task.object_id);
        self.tasks.write().await.push(task);
        Ok(id)
    }
}
