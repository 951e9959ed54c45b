//! Report building for the `fieldtmpl-check` binary.

use anyhow::{Context, Result};
use fieldtmpl_compare::SyncStatus;
use fieldtmpl_sync::{
    EngineConfig, FieldTemplateService, MemoryStore, ObjectUniquePlan, Snapshot,
    SyncStatusAggregator, SyncTask, TemplateReview,
};
use fieldtmpl_types::{ObjectId, TemplateId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Sync status of many objects bound to one template.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub template_id: TemplateId,
    pub checked: usize,
    pub need_sync: usize,
    pub statuses: Vec<SyncStatus>,
}

/// Changes a sync of one object would make.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlanReport {
    pub task: SyncTask,
    pub uniques: ObjectUniquePlan,
}

/// Reads an [`EngineConfig`] from a JSON file, or the defaults when no
/// file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&json).context("Failed to parse config file")
}

/// A service over a snapshot file, with the store kept for task inspection.
pub struct Checker {
    store: Arc<MemoryStore>,
    service: Arc<FieldTemplateService>,
}

impl Checker {
    pub fn open(snapshot: &Path, config: EngineConfig) -> Result<Self> {
        let snapshot = Snapshot::load(snapshot).context("Failed to load snapshot")?;
        Ok(Self::from_snapshot(snapshot, config))
    }

    pub fn from_snapshot(snapshot: Snapshot, config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::from_snapshot(snapshot));
        let service = Arc::new(FieldTemplateService::with_store(store.clone(), config));
        Self { store, service }
    }

    /// Checks `objects`, or every bound object when empty.
    pub async fn status(
        &self,
        template_id: TemplateId,
        objects: &[ObjectId],
    ) -> Result<StatusReport> {
        let objects = if objects.is_empty() {
            let mut bound: Vec<_> = self
                .service
                .bound_objects(template_id)
                .await?
                .into_iter()
                .collect();
            bound.sort();
            bound
        } else {
            objects.to_vec()
        };

        let statuses = SyncStatusAggregator::new(self.service.clone())
            .list_sync_status(template_id, &objects)
            .await
            .with_context(|| format!("Failed to check template {template_id}"))?;
        Ok(StatusReport {
            template_id,
            checked: statuses.len(),
            need_sync: statuses.iter().filter(|s| s.need_sync).count(),
            statuses,
        })
    }

    pub async fn diff(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> Result<TemplateReview> {
        self.service
            .review(template_id, object_id)
            .await
            .with_context(|| format!("Failed to review object {object_id}"))
    }

    /// Plans a sync without applying it; the task is only recorded.
    pub async fn plan(&self, template_id: TemplateId, object_id: ObjectId) -> Result<PlanReport> {
        let task_id = self
            .service
            .enqueue_sync(template_id, object_id)
            .await
            .with_context(|| format!("Failed to plan attributes of object {object_id}"))?;
        let task = self
            .store
            .tasks()
            .await
            .into_iter()
            .find(|t| t.id == task_id)
            .context("Planned task was not recorded")?;
        let uniques = self
            .service
            .plan_unique_sync(template_id, object_id)
            .await
            .with_context(|| format!("Failed to plan uniques of object {object_id}"))?;
        Ok(PlanReport { task, uniques })
    }
}
