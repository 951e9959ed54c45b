//! Template service: reads stores, runs comparisons, hands plans to the executor.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::store::{
    AttrFilter, AttrScope, BindingFilter, ModelStore, SyncTask, TaskExecutor, TemplateStore,
};
use fieldtmpl_compare::{
    validate_unique_key_types, AttrComparator, AttrComparison, AttrDiff, AttrIndex, CompareMode,
    ResolvedUnique, SyncStatus, UniqueComparator, UniqueComparison, UniqueDiff, UniqueIndex,
};
use fieldtmpl_model::{
    FieldTemplateAttr, FieldTemplateUnique, ObjectAttribute, ObjectModel, ObjectUnique,
    TemplateUniqueKeys,
};
use fieldtmpl_types::{
    AttrId, ObjectId, TaskId, TemplateAttrId, TemplateId, TemplateUniqueId, UniqueId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A template validated and indexed once, then shared read-only.
#[derive(Debug)]
pub struct PreparedTemplate {
    pub id: TemplateId,
    pub attrs: AttrIndex,
    pub uniques: UniqueIndex,
}

/// Unique changes for one object, with keys resolved to live attribute ids.
///
/// `create` entries carry a zero id; the store assigns the real one.
/// `update` entries hold the unique as it must look afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectUniquePlan {
    pub create: Vec<ObjectUnique>,
    pub update: Vec<ObjectUnique>,
}

impl ObjectUniquePlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }
}

/// Full review of a stored template against one bound object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateReview {
    pub template_id: TemplateId,
    pub object_id: ObjectId,
    pub attrs: AttrDiff,
    pub uniques: UniqueDiff,
}

/// Entry point for comparing templates against object models.
pub struct FieldTemplateService {
    templates: Arc<dyn TemplateStore>,
    models: Arc<dyn ModelStore>,
    executor: Arc<dyn TaskExecutor>,
    config: EngineConfig,
}

impl FieldTemplateService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        models: Arc<dyn ModelStore>,
        executor: Arc<dyn TaskExecutor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            templates,
            models,
            executor,
            config,
        }
    }

    /// Builds a service whose three collaborators are the same store.
    pub fn with_store<S>(store: Arc<S>, config: EngineConfig) -> Self
    where
        S: TemplateStore + ModelStore + TaskExecutor + 'static,
    {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Review ───────────────────────────────────────────────────

    /// Compares a possibly unsaved attribute list against one object.
    ///
    /// Live attributes tracking a template other than the one the list
    /// belongs to are treated as foreign.
    pub async fn compare_attrs(
        &self,
        object_id: ObjectId,
        attrs: Vec<FieldTemplateAttr>,
        mode: CompareMode,
    ) -> SyncResult<AttrComparison> {
        self.require_object(object_id).await?;
        let template_id = attrs.iter().find_map(|a| a.template_id);
        let index = AttrIndex::build(attrs, &self.config.compare)?;
        self.check_scope_collision(object_id, &index).await?;

        let live = self.live_attrs(object_id).await?;
        let foreign = self.foreign_attrs(template_id, &live).await?;
        Ok(AttrComparator::new(&index)
            .with_foreign(&foreign)
            .compare(object_id, &live, mode)?)
    }

    /// Compares a possibly unsaved unique list (keys are property ids)
    /// against one object.
    pub async fn compare_uniques(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
        uniques: Vec<TemplateUniqueKeys>,
        mode: CompareMode,
    ) -> SyncResult<UniqueComparison> {
        self.require_object(object_id).await?;
        let index = UniqueIndex::build(uniques)?;

        let attrs = self.live_attrs(object_id).await?;
        let live = self.live_uniques(object_id, &attrs).await?;
        let foreign = self.foreign_uniques(template_id, &live).await?;
        Ok(UniqueComparator::new(&index)
            .with_foreign(&foreign)
            .compare(object_id, &live, mode)?)
    }

    /// Reviews a stored template against one bound object.
    pub async fn review(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> SyncResult<TemplateReview> {
        let prepared = self.prepare(template_id).await?;
        self.require_object(object_id).await?;
        self.require_binding(template_id, object_id).await?;
        self.check_scope_collision(object_id, &prepared.attrs).await?;

        let attrs = self.live_attrs(object_id).await?;
        let foreign = self.foreign_attrs(Some(template_id), &attrs).await?;
        let attr_diff = AttrComparator::new(&prepared.attrs)
            .with_foreign(&foreign)
            .diff(&attrs);

        let uniques = self.live_uniques(object_id, &attrs).await?;
        let foreign = self.foreign_uniques(template_id, &uniques).await?;
        let unique_diff = UniqueComparator::new(&prepared.uniques)
            .with_foreign(&foreign)
            .diff(&uniques);

        Ok(TemplateReview {
            template_id,
            object_id,
            attrs: attr_diff,
            uniques: unique_diff,
        })
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Reads and validates a stored template.
    pub async fn prepare(&self, template_id: TemplateId) -> SyncResult<PreparedTemplate> {
        if self.templates.get_template(template_id).await?.is_none() {
            return Err(SyncError::TemplateNotFound(template_id));
        }

        let attrs = self.templates.list_template_attrs(template_id).await?;
        if attrs.is_empty() {
            warn!("template {} has no attributes", template_id);
            return Err(SyncError::EmptyTemplate(template_id));
        }
        let uniques = self.templates.list_template_uniques(template_id).await?;
        let keys = unique_keys_by_property(&attrs, &uniques)?;
        validate_unique_key_types(&keys, &attrs)?;

        let attrs = AttrIndex::build(attrs, &self.config.compare)?;
        let uniques = UniqueIndex::build(keys)?;
        debug!(
            "prepared template {} ({} attributes, {} uniques)",
            template_id,
            attrs.len(),
            uniques.len()
        );
        Ok(PreparedTemplate {
            id: template_id,
            attrs,
            uniques,
        })
    }

    /// Objects bound to a template.
    pub async fn bound_objects(&self, template_id: TemplateId) -> SyncResult<HashSet<ObjectId>> {
        let bindings = self
            .templates
            .list_bindings(BindingFilter::Template(template_id))
            .await?;
        Ok(bindings.into_iter().map(|b| b.object_id).collect())
    }

    /// Whether one bound object has drifted from the template.
    pub async fn sync_status(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> SyncResult<SyncStatus> {
        let prepared = self.prepare(template_id).await?;
        self.require_binding(template_id, object_id).await?;
        self.object_status(&prepared, object_id).await
    }

    /// Attributes first; uniques are only checked when attributes agree.
    pub async fn object_status(
        &self,
        prepared: &PreparedTemplate,
        object_id: ObjectId,
    ) -> SyncResult<SyncStatus> {
        self.check_scope_collision(object_id, &prepared.attrs).await?;

        let attrs = self.live_attrs(object_id).await?;
        let foreign = self.foreign_attrs(Some(prepared.id), &attrs).await?;
        let status = AttrComparator::new(&prepared.attrs)
            .with_foreign(&foreign)
            .status(object_id, &attrs);
        if status.need_sync {
            debug!("object {} attributes differ from template {}", object_id, prepared.id);
            return Ok(status);
        }

        let uniques = self.live_uniques(object_id, &attrs).await?;
        let foreign = self.foreign_uniques(prepared.id, &uniques).await?;
        let status = UniqueComparator::new(&prepared.uniques)
            .with_foreign(&foreign)
            .status(object_id, &uniques);
        debug!(
            "object {} checked against template {}: need_sync={}",
            object_id, prepared.id, status.need_sync
        );
        Ok(status)
    }

    /// Plans attribute sync for one object and hands it to the executor.
    pub async fn enqueue_sync(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> SyncResult<TaskId> {
        let prepared = self.prepare(template_id).await?;
        let object = self.require_object(object_id).await?;
        if object.is_paused {
            return Err(SyncError::ObjectPaused(object_id));
        }
        self.require_binding(template_id, object_id).await?;
        self.check_scope_collision(object_id, &prepared.attrs).await?;

        let live = self.live_attrs(object_id).await?;
        let foreign = self.foreign_attrs(Some(template_id), &live).await?;
        let plan = AttrComparator::new(&prepared.attrs)
            .with_foreign(&foreign)
            .plan(&live)?;

        let create = plan
            .create
            .iter()
            .map(|c| {
                prepared
                    .attrs
                    .get(c.index)
                    .map(|attr| ObjectAttribute::from_template(object_id, attr))
                    .ok_or_else(|| SyncError::MissingAttribute(c.property_id.clone()))
            })
            .collect::<SyncResult<Vec<_>>>()?;

        let task = SyncTask {
            id: TaskId::new(),
            template_id,
            object_id,
            create,
            update: plan.update,
        };
        info!(
            "enqueueing sync of template {} to object {}: {} create, {} update",
            template_id,
            object_id,
            task.create.len(),
            task.update.len()
        );
        self.executor.enqueue_sync(task).await
    }

    /// Plans unique sync for one object, once its attributes are in place.
    pub async fn plan_unique_sync(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> SyncResult<ObjectUniquePlan> {
        let prepared = self.prepare(template_id).await?;
        self.require_object(object_id).await?;
        self.require_binding(template_id, object_id).await?;

        let attrs = self.live_attrs(object_id).await?;
        let live = self.live_uniques(object_id, &attrs).await?;
        let foreign = self.foreign_uniques(template_id, &live).await?;
        let plan = UniqueComparator::new(&prepared.uniques)
            .with_foreign(&foreign)
            .plan(&live)?;

        let attr_ids: HashMap<&str, AttrId> = attrs
            .iter()
            .map(|a| (a.property_id.as_str(), a.id))
            .collect();
        let resolve = |keys: &[String]| -> SyncResult<Vec<AttrId>> {
            keys.iter()
                .map(|k| {
                    attr_ids
                        .get(k.as_str())
                        .copied()
                        .ok_or_else(|| SyncError::MissingAttribute(k.clone()))
                })
                .collect()
        };

        let mut out = ObjectUniquePlan::default();
        for create in &plan.create {
            out.create.push(ObjectUnique {
                id: UniqueId::new(0),
                object_id,
                template_id: prepared.uniques.get(create.index).and_then(|u| u.id),
                keys: resolve(&create.keys)?,
            });
        }
        for update in &plan.update {
            let template_id = match update.template_id {
                Some(binding) => binding.target(),
                None => update.unique.template_id,
            };
            out.update.push(ObjectUnique {
                id: update.unique.id,
                object_id,
                template_id,
                keys: resolve(&update.keys)?,
            });
        }
        Ok(out)
    }

    // ── Helpers ──────────────────────────────────────────────────

    async fn require_object(&self, object_id: ObjectId) -> SyncResult<ObjectModel> {
        self.models
            .get_object(object_id)
            .await?
            .ok_or(SyncError::ObjectNotFound(object_id))
    }

    async fn require_binding(
        &self,
        template_id: TemplateId,
        object_id: ObjectId,
    ) -> SyncResult<()> {
        let bindings = self
            .templates
            .list_bindings(BindingFilter::Object(object_id))
            .await?;
        if bindings.iter().any(|b| b.template_id == template_id) {
            Ok(())
        } else {
            Err(SyncError::NotBound {
                template_id,
                object_id,
            })
        }
    }

    async fn live_attrs(&self, object_id: ObjectId) -> SyncResult<Vec<ObjectAttribute>> {
        self.models
            .read_model_attrs(object_id, &AttrFilter::global())
            .await
    }

    /// Live uniques with keys resolved through `attrs`.
    async fn live_uniques(
        &self,
        object_id: ObjectId,
        attrs: &[ObjectAttribute],
    ) -> SyncResult<Vec<ResolvedUnique>> {
        let uniques = self.models.read_model_uniques(object_id).await?;
        if uniques.is_empty() {
            return Ok(Vec::new());
        }

        let property_ids: HashMap<AttrId, &str> = attrs
            .iter()
            .map(|a| (a.id, a.property_id.as_str()))
            .collect();
        uniques
            .into_iter()
            .map(|unique| {
                let keys = unique
                    .keys
                    .iter()
                    .map(|id| {
                        property_ids
                            .get(id)
                            .map(|p| p.to_string())
                            .ok_or_else(|| SyncError::MissingAttribute(format!("attribute {id}")))
                    })
                    .collect::<SyncResult<Vec<_>>>()?;
                Ok(ResolvedUnique::new(unique, keys))
            })
            .collect()
    }

    /// Template attributes may not reuse a property id or name already taken
    /// by a business-scope custom field of the object.
    async fn check_scope_collision(
        &self,
        object_id: ObjectId,
        index: &AttrIndex,
    ) -> SyncResult<()> {
        let filter = AttrFilter::scope(AttrScope::Business)
            .with_property_ids(index.attrs().iter().map(|a| a.property_id.clone()).collect())
            .with_property_names(index.attrs().iter().map(|a| a.property_name.clone()).collect());
        let hits = self.models.read_model_attrs(object_id, &filter).await?;

        match hits.iter().find_map(|a| a.biz_id.map(|biz| (biz, a))) {
            Some((biz_id, attr)) => {
                warn!(
                    "template attribute collides with `{}` of business {} on object {}",
                    attr.property_id, biz_id, object_id
                );
                Err(SyncError::ScopeCollision {
                    biz_id,
                    property_id: attr.property_id.clone(),
                })
            }
            None => Ok(()),
        }
    }

    async fn foreign_attrs(
        &self,
        template_id: Option<TemplateId>,
        live: &[ObjectAttribute],
    ) -> SyncResult<HashSet<TemplateAttrId>> {
        let ids: Vec<_> = live.iter().filter_map(|a| a.template_id).collect();
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let owners = self.templates.attr_owners(&ids).await?;
        Ok(owners
            .into_iter()
            .filter(|&(_, owner)| Some(owner) != template_id)
            .map(|(id, _)| id)
            .collect())
    }

    async fn foreign_uniques(
        &self,
        template_id: TemplateId,
        live: &[ResolvedUnique],
    ) -> SyncResult<HashSet<TemplateUniqueId>> {
        let ids: Vec<_> = live.iter().filter_map(|u| u.unique.template_id).collect();
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let owners = self.templates.unique_owners(&ids).await?;
        Ok(owners
            .into_iter()
            .filter(|&(_, owner)| owner != template_id)
            .map(|(id, _)| id)
            .collect())
    }
}

/// Rewrites stored unique keys (template attribute ids) as property ids.
fn unique_keys_by_property(
    attrs: &[FieldTemplateAttr],
    uniques: &[FieldTemplateUnique],
) -> SyncResult<Vec<TemplateUniqueKeys>> {
    let property_ids: HashMap<TemplateAttrId, &str> = attrs
        .iter()
        .filter_map(|a| Some((a.id?, a.property_id.as_str())))
        .collect();

    uniques
        .iter()
        .map(|unique| {
            let keys = unique
                .keys
                .iter()
                .map(|id| {
                    property_ids.get(id).map(|p| p.to_string()).ok_or_else(|| {
                        SyncError::MissingAttribute(format!("template attribute {id}"))
                    })
                })
                .collect::<SyncResult<Vec<_>>>()?;
            Ok(TemplateUniqueKeys {
                id: Some(unique.id),
                keys,
            })
        })
        .collect()
}
