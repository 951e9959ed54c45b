//! Sync-status aggregator.
//!
//! Checks many objects bound to one template with bounded parallelism. The
//! template is read and indexed once; workers share the indices.

use crate::error::{SyncError, SyncResult};
use crate::service::FieldTemplateService;
use fieldtmpl_compare::SyncStatus;
use fieldtmpl_types::{ObjectId, TemplateId};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Fans per-object status checks out over a worker budget.
#[derive(Clone)]
pub struct SyncStatusAggregator {
    service: Arc<FieldTemplateService>,
}

impl SyncStatusAggregator {
    pub fn new(service: Arc<FieldTemplateService>) -> Self {
        Self { service }
    }

    /// Returns one status per object id, in input order.
    ///
    /// Every object must be bound to the template. Workers are never
    /// cancelled: when some fail, the rest still run to completion and the
    /// first error to arrive is returned.
    pub async fn list_sync_status(
        &self,
        template_id: TemplateId,
        object_ids: &[ObjectId],
    ) -> SyncResult<Vec<SyncStatus>> {
        let prepared = Arc::new(self.service.prepare(template_id).await?);

        let bound = self.service.bound_objects(template_id).await?;
        if let Some(&object_id) = object_ids.iter().find(|id| !bound.contains(id)) {
            return Err(SyncError::NotBound {
                template_id,
                object_id,
            });
        }

        let concurrency = self.service.config().effective_concurrency();
        info!(
            "checking sync status of {} objects against template {} ({} at a time)",
            object_ids.len(),
            template_id,
            concurrency
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut workers = JoinSet::new();
        for (pos, &object_id) in object_ids.iter().enumerate() {
            let service = Arc::clone(&self.service);
            let prepared = Arc::clone(&prepared);
            let semaphore = Arc::clone(&semaphore);

            workers.spawn(async move {
                let _permit = semaphore.acquire().await;
                let result = service.object_status(&prepared, object_id).await;
                (pos, result)
            });
        }

        // Each worker owns exactly one slot.
        let mut slots: Vec<Option<SyncStatus>> = vec![None; object_ids.len()];
        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((pos, Ok(status))) => slots[pos] = Some(status),
                Ok((pos, Err(err))) => {
                    warn!("sync status check of object {} failed: {}", object_ids[pos], err);
                    first_error.get_or_insert(err);
                }
                Err(err) => {
                    warn!("sync status worker died: {}", err);
                    first_error.get_or_insert(SyncError::Worker(err.to_string()));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        slots
            .into_iter()
            .zip(object_ids)
            .map(|(slot, object_id)| {
                slot.ok_or_else(|| SyncError::Worker(format!("no result for object {object_id}")))
            })
            .collect()
    }
}
