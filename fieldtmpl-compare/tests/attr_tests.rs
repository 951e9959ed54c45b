use fieldtmpl_compare::{
    AttrComparator, AttrIndex, AttrPatch, CompareConfig, CompareError, CompareMode, Comparison,
    ConflictField,
};
use fieldtmpl_model::{FieldTemplateAttr, Lockable, ObjectAttribute, PropertyType, TemplateBinding};
use fieldtmpl_types::{AttrId, ObjectId, TemplateAttrId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

const OBJ: ObjectId = ObjectId::new(1);

fn tmpl(id: i64, pid: &str, t: PropertyType) -> FieldTemplateAttr {
    FieldTemplateAttr::new(pid, pid, t).with_id(id)
}

fn live(id: i64, pid: &str, t: PropertyType) -> ObjectAttribute {
    ObjectAttribute::new(id, OBJ, pid, t)
}

fn index(attrs: Vec<FieldTemplateAttr>) -> AttrIndex {
    AttrIndex::build(attrs, &CompareConfig::default()).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────

#[test]
fn bound_identical_attr_is_unchanged() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::Int).with_template(1)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert!(diff.create.is_empty());
    assert!(diff.update.is_empty());
    assert!(diff.conflict.is_empty());
    assert_eq!(diff.unchanged.len(), 1);
    assert_eq!(diff.unchanged[0].index, Some(0));
    assert_eq!(diff.unchanged[0].attr.id, AttrId::new(10));
}

#[test]
fn unmanaged_attr_with_other_type_conflicts_on_type() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::SingleChar)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.conflict.len(), 1);
    let conflict = &diff.conflict[0];
    assert_eq!(conflict.index, 0);
    assert_eq!(conflict.property_id, "cpu");
    assert_eq!(conflict.field, ConflictField::PropertyType);
    assert!(conflict.message.contains("property_type"));
    assert!(diff.create.is_empty(), "conflicting template attr must not be created");
}

#[test]
fn empty_object_creates_every_template_attr() {
    let index = index(vec![
        tmpl(1, "cpu", PropertyType::Int),
        tmpl(2, "mem", PropertyType::Int),
    ]);

    let diff = AttrComparator::new(&index).diff(&[]);
    let created: Vec<_> = diff.create.iter().map(|c| (c.index, c.property_id.as_str())).collect();
    assert_eq!(created, vec![(0, "cpu"), (1, "mem")]);
    assert!(diff.unchanged.is_empty());
}

// ── Template identity ────────────────────────────────────────────

#[test]
fn bound_attr_with_renamed_property_id_conflicts() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cores", PropertyType::Int).with_template(1)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.conflict.len(), 1);
    assert_eq!(diff.conflict[0].field, ConflictField::PropertyId);
    assert!(diff.create.is_empty());
}

#[test]
fn bound_attr_takes_template_name_and_unit() {
    let mut t = FieldTemplateAttr::new("cpu", "CPU cores", PropertyType::Int).with_id(1);
    t.unit = "core".into();
    let index = index(vec![t]);
    let attrs = vec![live(10, "cpu", PropertyType::Int).with_template(1)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.update.len(), 1);
    let update = &diff.update[0];
    assert_eq!(update.index, Some(0));
    assert_eq!(update.patch.property_name.as_deref(), Some("CPU cores"));
    assert_eq!(update.patch.unit.as_deref(), Some("core"));
    assert_eq!(update.patch.changed_fields(), vec!["property_name", "unit"]);
}

#[test]
fn only_locked_fields_are_enforced() {
    let mut t = tmpl(1, "cpu", PropertyType::Int);
    t.required = Lockable::locked(true);
    t.editable = Lockable::unlocked(false);
    t.placeholder = Lockable::unlocked("number of cores".into());
    let index = index(vec![t]);
    let attrs = vec![live(10, "cpu", PropertyType::Int).with_template(1)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.update.len(), 1);
    let patch = &diff.update[0].patch;
    assert_eq!(patch.required, Some(true));
    assert_eq!(patch.editable, None);
    assert_eq!(patch.placeholder, None);
}

#[test]
fn unset_multiplicity_matches_single_valued_template() {
    let index = index(vec![tmpl(1, "tags", PropertyType::EnumMulti)]);
    let mut attr = live(10, "tags", PropertyType::EnumMulti).with_template(1);
    attr.is_multiple = None;

    let diff = AttrComparator::new(&index).diff(&[attr.clone()]);
    assert!(diff.update.is_empty());

    attr.is_multiple = Some(true);
    let diff = AttrComparator::new(&index).diff(&[attr]);
    assert_eq!(diff.update[0].patch.is_multiple, Some(false));
}

#[test]
fn cleared_template_option_is_a_null_patch() {
    let index = index(vec![tmpl(1, "os", PropertyType::Enum)]);
    let mut attr = live(10, "os", PropertyType::Enum).with_template(1);
    attr.option = Some(json!([{"id": "linux"}]));

    let diff = AttrComparator::new(&index).diff(&[attr.clone()]);
    let patch = &diff.update[0].patch;
    assert_eq!(patch.option, Some(serde_json::Value::Null));
    assert_eq!(patch.apply(&attr).option, None);
}

// ── Unmanaged attributes ─────────────────────────────────────────

#[test]
fn unmanaged_match_is_bound_only_in_backend() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::Int)];
    let cmp = AttrComparator::new(&index);

    let diff = cmp.diff(&attrs);
    assert_eq!(diff.unchanged.len(), 1);
    assert_eq!(diff.unchanged[0].index, Some(0));

    let plan = cmp.plan(&attrs).unwrap();
    assert!(plan.create.is_empty());
    assert_eq!(plan.update.len(), 1);
    assert_eq!(
        plan.update[0].patch,
        AttrPatch {
            template_id: Some(TemplateBinding::Bind(TemplateAttrId::new(1))),
            ..AttrPatch::default()
        }
    );
    assert_eq!(
        plan.update[0].patch.apply(&attrs[0]).template_id,
        Some(TemplateAttrId::new(1))
    );
}

#[test]
fn unmanaged_attr_taking_template_name_conflicts_on_name() {
    let index = index(vec![FieldTemplateAttr::new("cpu", "CPU", PropertyType::Int).with_id(1)]);
    let attrs = vec![live(10, "cores", PropertyType::Int).with_name("CPU")];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.conflict.len(), 1);
    assert_eq!(diff.conflict[0].field, ConflictField::PropertyName);
    assert_eq!(diff.conflict[0].attr.property_id, "cores");
    assert!(diff.create.is_empty());
}

#[test]
fn renamed_match_blocks_unmanaged_attr_holding_its_name() {
    let index = index(vec![FieldTemplateAttr::new("cpu", "CPU", PropertyType::Int).with_id(1)]);
    let attrs = vec![
        live(10, "cpu", PropertyType::Int).with_template(1).with_name("Old"),
        live(11, "x", PropertyType::Int).with_name("CPU"),
    ];
    let cmp = AttrComparator::new(&index);

    let diff = cmp.diff(&attrs);
    assert_eq!(diff.update.len(), 1);
    assert_eq!(diff.update[0].attr.id, AttrId::new(10));
    assert_eq!(diff.conflict.len(), 1);
    assert_eq!(diff.conflict[0].index, 0);
    assert_eq!(diff.conflict[0].field, ConflictField::PropertyName);
    assert_eq!(diff.conflict[0].attr.id, AttrId::new(11));

    let err = cmp.plan(&attrs).unwrap_err();
    assert!(matches!(
        err,
        CompareError::AttrConflict { attr_id, field: ConflictField::PropertyName, .. }
            if attr_id == AttrId::new(11)
    ));
    assert!(cmp.status(OBJ, &attrs).need_sync);
}

#[test]
fn orphan_holding_name_of_matched_attr_conflicts() {
    let index = index(vec![FieldTemplateAttr::new("cpu", "CPU", PropertyType::Int).with_id(1)]);
    let attrs = vec![
        live(10, "cpu", PropertyType::Int).with_template(1).with_name("CPU"),
        live(11, "y", PropertyType::Int).with_template(99).with_name("CPU"),
    ];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.unchanged.len(), 1);
    assert_eq!(diff.unchanged[0].attr.id, AttrId::new(10));
    assert_eq!(diff.conflict.len(), 1);
    assert_eq!(diff.conflict[0].field, ConflictField::PropertyName);
    assert_eq!(diff.conflict[0].attr.id, AttrId::new(11));
}

#[test]
fn unrelated_attrs_are_left_alone() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![
        live(10, "cpu", PropertyType::Int).with_template(1),
        live(11, "disk", PropertyType::Int),
    ];

    let cmp = AttrComparator::new(&index);
    let diff = cmp.diff(&attrs);
    assert_eq!(diff.unchanged.len(), 2);
    assert_eq!(diff.unchanged[1].index, None);
    assert!(!cmp.status(OBJ, &attrs).need_sync);
}

// ── Orphans ──────────────────────────────────────────────────────

#[test]
fn orphan_is_detached_in_backend_and_unchanged_in_ui() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![
        live(10, "cpu", PropertyType::Int).with_template(1),
        live(11, "rack", PropertyType::SingleChar).with_template(99),
    ];
    let cmp = AttrComparator::new(&index);

    let diff = cmp.diff(&attrs);
    assert!(diff.update.is_empty());
    assert_eq!(diff.unchanged.len(), 2);

    let plan = cmp.plan(&attrs).unwrap();
    assert_eq!(plan.update.len(), 1);
    let detach = &plan.update[0];
    assert_eq!(detach.index, None);
    assert_eq!(detach.property_id, "rack");
    assert_eq!(detach.patch, AttrPatch::unbind());
    assert_eq!(detach.patch.apply(&attrs[1]).template_id, None);

    assert!(cmp.status(OBJ, &attrs).need_sync);
}

#[test]
fn orphan_owned_by_other_template_is_kept() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![
        live(10, "cpu", PropertyType::Int).with_template(1),
        live(11, "rack", PropertyType::SingleChar).with_template(99),
    ];
    let foreign: HashSet<_> = [TemplateAttrId::new(99)].into_iter().collect();
    let cmp = AttrComparator::new(&index).with_foreign(&foreign);

    assert!(cmp.plan(&attrs).unwrap().is_empty());
    assert!(!cmp.status(OBJ, &attrs).need_sync);
}

#[test]
fn orphan_holding_template_property_id_conflicts() {
    // The template attribute was deleted and re-added under a new id.
    let index = index(vec![tmpl(2, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::Int).with_template(1)];

    let diff = AttrComparator::new(&index).diff(&attrs);
    assert_eq!(diff.conflict.len(), 1);
    assert_eq!(diff.conflict[0].field, ConflictField::PropertyId);
    assert!(diff.create.is_empty());
}

// ── Modes ────────────────────────────────────────────────────────

#[test]
fn backend_full_raises_conflicts() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::Float)];

    let err = AttrComparator::new(&index).plan(&attrs).unwrap_err();
    match err {
        CompareError::AttrConflict {
            attr_id,
            field,
            property_id,
        } => {
            assert_eq!(attr_id, AttrId::new(10));
            assert_eq!(field, ConflictField::PropertyType);
            assert_eq!(property_id, "cpu");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn partial_mode_reports_creates() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let status = AttrComparator::new(&index).status(OBJ, &[]);
    assert_eq!(status.object_id, OBJ);
    assert!(status.need_sync);
}

#[test]
fn only_ui_mode_skips_backend_semantics() {
    assert!(!CompareMode::Ui.is_backend());
    assert!(CompareMode::BackendFull.is_backend());
    assert!(CompareMode::BackendPartial.is_backend());
}

#[test]
fn compare_dispatches_on_mode() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let cmp = AttrComparator::new(&index);

    let ui = cmp.compare(OBJ, &[], CompareMode::Ui).unwrap();
    assert_eq!(ui.into_diff().map(|d| d.create.len()), Some(1));

    let full = cmp.compare(OBJ, &[], CompareMode::BackendFull).unwrap();
    assert!(matches!(full, Comparison::Plan(ref p) if p.create.len() == 1));

    let partial = cmp.compare(OBJ, &[], CompareMode::BackendPartial).unwrap();
    assert_eq!(partial.into_status().map(|s| s.need_sync), Some(true));
}

#[test]
fn ui_compare_never_fails_on_conflict() {
    let index = index(vec![tmpl(1, "cpu", PropertyType::Int)]);
    let attrs = vec![live(10, "cpu", PropertyType::Float)];
    assert!(AttrComparator::new(&index).compare(OBJ, &attrs, CompareMode::Ui).is_ok());
}
