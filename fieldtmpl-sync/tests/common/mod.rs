//! Shared fixtures for sync tests.

#![allow(dead_code)]

use fieldtmpl_model::{
    FieldTemplate, FieldTemplateAttr, FieldTemplateUnique, ObjectAttribute, ObjectModel,
    ObjectUnique, PropertyType, TemplateObjectBinding,
};
use fieldtmpl_sync::{EngineConfig, FieldTemplateService, MemoryStore, Snapshot};
use fieldtmpl_types::{
    AttrId, BizId, ObjectId, TemplateAttrId, TemplateId, TemplateUniqueId, UniqueId,
};
use std::sync::Arc;

pub const TEMPLATE: TemplateId = TemplateId::new(1);
pub const EMPTY_TEMPLATE: TemplateId = TemplateId::new(2);
pub const CPU: TemplateAttrId = TemplateAttrId::new(11);
pub const SN: TemplateAttrId = TemplateAttrId::new(12);
pub const SN_UNIQUE: TemplateUniqueId = TemplateUniqueId::new(21);

/// `cpu` (int) and `sn` (singlechar), with `sn` unique.
pub fn template_attrs() -> Vec<FieldTemplateAttr> {
    let mut cpu = FieldTemplateAttr::new("cpu", "CPU", PropertyType::Int).with_id(CPU.get());
    cpu.template_id = Some(TEMPLATE);
    let mut sn =
        FieldTemplateAttr::new("sn", "Serial", PropertyType::SingleChar).with_id(SN.get());
    sn.template_id = Some(TEMPLATE);
    vec![cpu, sn]
}

pub fn base_snapshot() -> Snapshot {
    Snapshot {
        templates: vec![
            FieldTemplate {
                id: TEMPLATE,
                name: "server".into(),
                description: String::new(),
            },
            FieldTemplate {
                id: EMPTY_TEMPLATE,
                name: "empty".into(),
                description: String::new(),
            },
        ],
        template_attrs: template_attrs(),
        template_uniques: vec![FieldTemplateUnique {
            id: SN_UNIQUE,
            template_id: TEMPLATE,
            keys: vec![SN],
        }],
        ..Snapshot::default()
    }
}

pub fn object(id: i64) -> ObjectModel {
    ObjectModel {
        id: ObjectId::new(id),
        obj_id: format!("obj{id}"),
        name: format!("Object {id}"),
        is_paused: false,
    }
}

/// Attribute ids are derived from the object id: `id * 10 + slot`.
pub fn synced_attrs(object_id: ObjectId) -> Vec<ObjectAttribute> {
    template_attrs()
        .iter()
        .enumerate()
        .map(|(slot, tmpl)| {
            let mut attr = ObjectAttribute::from_template(object_id, tmpl);
            attr.id = AttrId::new(object_id.get() * 10 + slot as i64);
            attr
        })
        .collect()
}

pub fn synced_unique(object_id: ObjectId) -> ObjectUnique {
    ObjectUnique {
        id: UniqueId::new(object_id.get() * 10),
        object_id,
        template_id: Some(SN_UNIQUE),
        keys: vec![AttrId::new(object_id.get() * 10 + 1)],
    }
}

/// Adds a bound object whose schema matches the template exactly.
pub fn add_synced(snapshot: &mut Snapshot, id: i64) {
    let object_id = ObjectId::new(id);
    snapshot.objects.push(object(id));
    snapshot.bindings.push(TemplateObjectBinding {
        template_id: TEMPLATE,
        object_id,
    });
    snapshot.attrs.extend(synced_attrs(object_id));
    snapshot.uniques.push(synced_unique(object_id));
}

/// Adds a bound object whose `cpu` attribute was renamed.
pub fn add_drifted(snapshot: &mut Snapshot, id: i64) {
    add_synced(snapshot, id);
    let object_id = ObjectId::new(id);
    if let Some(cpu) = snapshot
        .attrs
        .iter_mut()
        .find(|a| a.object_id == object_id && a.property_id == "cpu")
    {
        cpu.property_name = "Cores".into();
    }
}

/// Adds a bound object that carries a business field named like a template attribute.
pub fn add_colliding(snapshot: &mut Snapshot, id: i64) {
    add_synced(snapshot, id);
    let mut custom =
        ObjectAttribute::new(id * 10 + 9, ObjectId::new(id), "sn", PropertyType::LongChar);
    custom.biz_id = Some(BizId::new(3));
    snapshot.attrs.push(custom);
}

pub fn service(snapshot: Snapshot) -> (Arc<MemoryStore>, FieldTemplateService) {
    service_with(snapshot, EngineConfig::default())
}

pub fn service_with(
    snapshot: Snapshot,
    config: EngineConfig,
) -> (Arc<MemoryStore>, FieldTemplateService) {
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    let service = FieldTemplateService::with_store(store.clone(), config);
    (store, service)
}
