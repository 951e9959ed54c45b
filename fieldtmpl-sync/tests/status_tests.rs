mod common;

use async_trait::async_trait;
use common::*;
use fieldtmpl_model::{
    FieldTemplate, FieldTemplateAttr, FieldTemplateUnique, ObjectAttribute, ObjectModel,
    ObjectUnique, TemplateObjectBinding,
};
use fieldtmpl_sync::{
    AttrFilter, BindingFilter, EngineConfig, FieldTemplateService, MemoryStore, ModelStore,
    SyncError, SyncResult, SyncStatusAggregator, SyncTask, TaskExecutor, TemplateStore,
};
use fieldtmpl_types::{ObjectId, TaskId, TemplateAttrId, TemplateId, TemplateUniqueId};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn aggregator(service: FieldTemplateService) -> SyncStatusAggregator {
    SyncStatusAggregator::new(Arc::new(service))
}

fn ids(raw: &[i64]) -> Vec<ObjectId> {
    raw.iter().copied().map(ObjectId::new).collect()
}

/// Wraps a [`MemoryStore`] and records how many attribute reads overlap.
struct CountingStore {
    inner: MemoryStore,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TemplateStore for CountingStore {
    async fn get_template(&self, id: TemplateId) -> SyncResult<Option<FieldTemplate>> {
        self.inner.get_template(id).await
    }

    async fn list_template_attrs(&self, id: TemplateId) -> SyncResult<Vec<FieldTemplateAttr>> {
        self.inner.list_template_attrs(id).await
    }

    async fn list_template_uniques(
        &self,
        id: TemplateId,
    ) -> SyncResult<Vec<FieldTemplateUnique>> {
        self.inner.list_template_uniques(id).await
    }

    async fn list_bindings(
        &self,
        filter: BindingFilter,
    ) -> SyncResult<Vec<TemplateObjectBinding>> {
        self.inner.list_bindings(filter).await
    }

    async fn attr_owners(
        &self,
        ids: &[TemplateAttrId],
    ) -> SyncResult<HashMap<TemplateAttrId, TemplateId>> {
        self.inner.attr_owners(ids).await
    }

    async fn unique_owners(
        &self,
        ids: &[TemplateUniqueId],
    ) -> SyncResult<HashMap<TemplateUniqueId, TemplateId>> {
        self.inner.unique_owners(ids).await
    }
}

#[async_trait]
impl ModelStore for CountingStore {
    async fn get_object(&self, id: ObjectId) -> SyncResult<Option<ObjectModel>> {
        self.inner.get_object(id).await
    }

    async fn read_model_attrs(
        &self,
        object_id: ObjectId,
        filter: &AttrFilter,
    ) -> SyncResult<Vec<ObjectAttribute>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = self.inner.read_model_attrs(object_id, filter).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn read_model_uniques(&self, object_id: ObjectId) -> SyncResult<Vec<ObjectUnique>> {
        self.inner.read_model_uniques(object_id).await
    }
}

#[async_trait]
impl TaskExecutor for CountingStore {
    async fn enqueue_sync(&self, task: SyncTask) -> SyncResult<TaskId> {
        self.inner.enqueue_sync(task).await
    }
}

// ── Results ──────────────────────────────────────────────────────

#[tokio::test]
async fn statuses_follow_input_order() {
    let mut snapshot = base_snapshot();
    add_synced(&mut snapshot, 100);
    add_drifted(&mut snapshot, 101);
    add_synced(&mut snapshot, 102);
    add_drifted(&mut snapshot, 103);
    let (_, service) = service(snapshot);

    let input = ids(&[103, 100, 102, 101]);
    let statuses = aggregator(service)
        .list_sync_status(TEMPLATE, &input)
        .await
        .unwrap();

    let got: Vec<_> = statuses.iter().map(|s| (s.object_id, s.need_sync)).collect();
    assert_eq!(
        got,
        vec![
            (ObjectId::new(103), true),
            (ObjectId::new(100), false),
            (ObjectId::new(102), false),
            (ObjectId::new(101), true),
        ]
    );
}

#[tokio::test]
async fn empty_input_gives_empty_output() {
    let (_, service) = service(base_snapshot());

    let statuses = aggregator(service)
        .list_sync_status(TEMPLATE, &[])
        .await
        .unwrap();
    assert!(statuses.is_empty());
}

#[tokio::test]
async fn unbound_object_fails_before_any_check() {
    let mut snapshot = base_snapshot();
    add_synced(&mut snapshot, 100);
    snapshot.objects.push(object(200));
    let (_, service) = service(snapshot);

    let err = aggregator(service)
        .list_sync_status(TEMPLATE, &ids(&[100, 200]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::NotBound { object_id, .. } if object_id == ObjectId::new(200)
    ));
}

#[tokio::test]
async fn template_errors_are_reported_once() {
    let mut snapshot = base_snapshot();
    add_synced(&mut snapshot, 100);
    let (_, service) = service(snapshot);

    let err = aggregator(service)
        .list_sync_status(EMPTY_TEMPLATE, &ids(&[100]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::EmptyTemplate(_)));
}

#[tokio::test]
async fn failing_object_fails_the_batch() {
    let mut snapshot = base_snapshot();
    add_synced(&mut snapshot, 100);
    add_colliding(&mut snapshot, 101);
    add_synced(&mut snapshot, 102);
    let (_, service) = service(snapshot);

    let err = aggregator(service)
        .list_sync_status(TEMPLATE, &ids(&[100, 101, 102]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::ScopeCollision { .. }));
}

// ── Concurrency ──────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn checks_never_exceed_the_worker_budget() {
    let mut snapshot = base_snapshot();
    let raw: Vec<i64> = (100..112).collect();
    for &id in &raw {
        add_synced(&mut snapshot, id);
    }
    let store = Arc::new(CountingStore::new(MemoryStore::from_snapshot(snapshot)));
    let config = EngineConfig {
        max_concurrency: 3,
        ..EngineConfig::default()
    };
    let service = FieldTemplateService::with_store(store.clone(), config);

    let statuses = aggregator(service)
        .list_sync_status(TEMPLATE, &ids(&raw))
        .await
        .unwrap();

    assert_eq!(statuses.len(), raw.len());
    assert!(statuses.iter().all(|s| !s.need_sync));
    let max = store.max_in_flight.load(Ordering::SeqCst);
    assert!((1..=3).contains(&max), "max in flight was {max}");
    assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_concurrency_still_makes_progress() {
    let mut snapshot = base_snapshot();
    add_synced(&mut snapshot, 100);
    add_drifted(&mut snapshot, 101);
    let store = Arc::new(CountingStore::new(MemoryStore::from_snapshot(snapshot)));
    let config = EngineConfig {
        max_concurrency: 0,
        ..EngineConfig::default()
    };
    let service = FieldTemplateService::with_store(store.clone(), config);

    let statuses = aggregator(service)
        .list_sync_status(TEMPLATE, &ids(&[100, 101]))
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    assert!(statuses[1].need_sync);
    assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
}
