//! Attribute comparator.
//!
//! Live attributes are resolved against the template in priority passes:
//!
//! 1. template identity (`template_id`)
//! 2. orphans whose template entry is gone: conflict check, else detach
//! 3. property id, for unmanaged attributes
//! 4. property name, as a last-resort conflict signal
//! 5. whatever template attribute is still unclaimed must be created
//!
//! Every match or conflict claims its template attribute, so each template
//! attribute receives exactly one classification. The exception is a name
//! conflict with an attribute already matched, which is reported in
//! addition to that match.

use crate::diff::{
    AttrConflict, AttrCreate, AttrDiff, AttrPatch, AttrSyncPlan, AttrUnchanged, AttrUpdate,
};
use crate::normalize::Claims;
use crate::{
    AttrComparison, AttrIndex, CompareError, CompareMode, CompareResult, Comparison, ConflictField,
    SyncStatus,
};
use fieldtmpl_model::ObjectAttribute;
use fieldtmpl_types::{ObjectId, TemplateAttrId};
use std::collections::HashSet;
use std::ops::ControlFlow;
use tracing::debug;

/// One classification made by the resolution core.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrOutcome<'a> {
    /// Template attribute at `index` has no live counterpart.
    Create { index: usize },
    /// Live attribute matches template attribute `index` but differs.
    Update {
        index: usize,
        attr: &'a ObjectAttribute,
        patch: AttrPatch,
    },
    /// Live attribute's template entry is gone; it should become unmanaged.
    Detach { attr: &'a ObjectAttribute },
    /// Live attribute collides with template attribute `index` on `field`.
    Conflict {
        index: usize,
        attr: &'a ObjectAttribute,
        field: ConflictField,
    },
    /// Live attribute needs nothing; `index` is its match, if any.
    Unchanged {
        index: Option<usize>,
        attr: &'a ObjectAttribute,
    },
}

/// Compares live attributes of one object against an [`AttrIndex`].
#[derive(Debug, Clone, Copy)]
pub struct AttrComparator<'i> {
    index: &'i AttrIndex,
    foreign: Option<&'i HashSet<TemplateAttrId>>,
}

impl<'i> AttrComparator<'i> {
    pub fn new(index: &'i AttrIndex) -> Self {
        Self {
            index,
            foreign: None,
        }
    }

    /// Template attribute ids owned by other templates bound to the same
    /// object. Live attributes tracking one of those are left alone.
    pub fn with_foreign(mut self, foreign: &'i HashSet<TemplateAttrId>) -> Self {
        self.foreign = Some(foreign);
        self
    }

    /// Runs the comparison in `mode`.
    ///
    /// Only [`CompareMode::BackendFull`] can fail, when a conflict would
    /// force unattended sync to guess.
    pub fn compare(
        &self,
        object_id: ObjectId,
        live: &[ObjectAttribute],
        mode: CompareMode,
    ) -> CompareResult<AttrComparison> {
        Ok(match mode {
            CompareMode::Ui => Comparison::Diff(self.diff(live)),
            CompareMode::BackendFull => Comparison::Plan(self.plan(live)?),
            CompareMode::BackendPartial => Comparison::Status(self.status(object_id, live)),
        })
    }

    /// Detailed diff for review. Conflicts are reported, never raised.
    pub fn diff(&self, live: &[ObjectAttribute]) -> AttrDiff {
        let mut diff = AttrDiff::default();
        let _ = self.resolve(live, CompareMode::Ui, |outcome| {
            match outcome {
                AttrOutcome::Create { index } => diff.create.push(self.create_entry(index)),
                AttrOutcome::Update { index, attr, patch } => diff.update.push(AttrUpdate {
                    index: Some(index),
                    property_id: self.index.attr(index).property_id.clone(),
                    attr: attr.clone(),
                    patch,
                }),
                AttrOutcome::Conflict { index, attr, field } => {
                    let property_id = self.index.attr(index).property_id.clone();
                    let message = conflict_error(attr, field, &property_id).to_string();
                    diff.conflict.push(AttrConflict {
                        index,
                        property_id,
                        field,
                        message,
                        attr: attr.clone(),
                    });
                }
                AttrOutcome::Detach { attr } => diff.unchanged.push(AttrUnchanged {
                    index: None,
                    attr: attr.clone(),
                }),
                AttrOutcome::Unchanged { index, attr } => diff.unchanged.push(AttrUnchanged {
                    index,
                    attr: attr.clone(),
                }),
            }
            ControlFlow::<()>::Continue(())
        });
        diff
    }

    /// Plan for unattended sync. Fails on the first conflict.
    pub fn plan(&self, live: &[ObjectAttribute]) -> CompareResult<AttrSyncPlan> {
        let mut plan = AttrSyncPlan::default();
        let flow = self.resolve(live, CompareMode::BackendFull, |outcome| {
            match outcome {
                AttrOutcome::Create { index } => plan.create.push(self.create_entry(index)),
                AttrOutcome::Update { index, attr, patch } => plan.update.push(AttrUpdate {
                    index: Some(index),
                    property_id: self.index.attr(index).property_id.clone(),
                    attr: attr.clone(),
                    patch,
                }),
                AttrOutcome::Detach { attr } => plan.update.push(AttrUpdate {
                    index: None,
                    property_id: attr.property_id.clone(),
                    attr: attr.clone(),
                    patch: AttrPatch::unbind(),
                }),
                AttrOutcome::Conflict { index, attr, field } => {
                    let property_id = &self.index.attr(index).property_id;
                    return ControlFlow::Break(conflict_error(attr, field, property_id));
                }
                AttrOutcome::Unchanged { .. } => {}
            }
            ControlFlow::Continue(())
        });

        match flow {
            ControlFlow::Break(err) => Err(err),
            ControlFlow::Continue(()) => Ok(plan),
        }
    }

    /// Whether the object needs sync. Stops at the first difference.
    pub fn status(&self, object_id: ObjectId, live: &[ObjectAttribute]) -> SyncStatus {
        let flow = self.resolve(live, CompareMode::BackendPartial, |outcome| match outcome {
            AttrOutcome::Unchanged { .. } => ControlFlow::Continue(()),
            _ => ControlFlow::Break(()),
        });
        SyncStatus {
            object_id,
            need_sync: flow.is_break(),
        }
    }

    fn create_entry(&self, index: usize) -> AttrCreate {
        AttrCreate {
            index,
            property_id: self.index.attr(index).property_id.clone(),
        }
    }

    fn is_foreign(&self, id: TemplateAttrId) -> bool {
        self.foreign.is_some_and(|f| f.contains(&id))
    }

    /// The resolution core shared by every mode.
    ///
    /// Backend modes switch on backend semantics: unmanaged matches get bound and
    /// orphans are detached instead of being reported unchanged.
    pub(crate) fn resolve<'a, B>(
        &self,
        live: &'a [ObjectAttribute],
        mode: CompareMode,
        mut emit: impl FnMut(AttrOutcome<'a>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let backend = mode.is_backend();
        let index = self.index;
        let mut claims = index.claims();

        // Template identity has the highest priority.
        let mut orphans = Vec::new();
        let mut unmanaged = Vec::new();
        for attr in live {
            match attr.template_id {
                Some(tid) => match index.free_by_id(tid, &claims) {
                    Some(pos) => {
                        claims.claim(pos);
                        emit(self.match_pair(pos, attr, backend))?;
                    }
                    None => orphans.push((tid, attr)),
                },
                None => unmanaged.push(attr),
            }
        }

        for (tid, attr) in orphans {
            if let Some(outcome) = self.name_or_id_conflict(attr, &mut claims, true) {
                emit(outcome)?;
            } else if self.is_foreign(tid) || !backend {
                emit(AttrOutcome::Unchanged { index: None, attr })?;
            } else {
                debug!("attribute {} lost template attribute {}, detaching", attr.id, tid);
                emit(AttrOutcome::Detach { attr })?;
            }
        }

        let mut leftovers = Vec::new();
        for attr in unmanaged {
            match index.free_by_property_id(&attr.property_id, &claims) {
                Some(pos) => {
                    claims.claim(pos);
                    emit(self.match_pair(pos, attr, backend))?;
                }
                None => leftovers.push(attr),
            }
        }

        for attr in leftovers {
            match self.name_or_id_conflict(attr, &mut claims, false) {
                Some(outcome) => emit(outcome)?,
                None => emit(AttrOutcome::Unchanged { index: None, attr })?,
            }
        }

        for pos in claims.unclaimed() {
            emit(AttrOutcome::Create { index: pos })?;
        }
        ControlFlow::Continue(())
    }

    /// Classifies a pair already matched by template id or property id.
    fn match_pair<'a>(&self, pos: usize, attr: &'a ObjectAttribute, bind: bool) -> AttrOutcome<'a> {
        let tmpl = self.index.attr(pos);

        let field = if attr.property_id != tmpl.property_id {
            Some(ConflictField::PropertyId)
        } else if attr.property_type != tmpl.property_type {
            Some(ConflictField::PropertyType)
        } else {
            None
        };
        if let Some(field) = field {
            debug!("attribute {} conflicts with `{}` on {}", attr.id, tmpl.property_id, field);
            return AttrOutcome::Conflict {
                index: pos,
                attr,
                field,
            };
        }

        let patch = AttrPatch::between(tmpl, attr, bind);
        if patch.is_empty() {
            AttrOutcome::Unchanged {
                index: Some(pos),
                attr,
            }
        } else {
            AttrOutcome::Update {
                index: pos,
                attr,
                patch,
            }
        }
    }

    /// Looks for a template attribute the live one would collide with once
    /// synced, claiming it on a hit.
    ///
    /// Property ids are checked against unclaimed entries only. Names are
    /// checked against every entry: a matched attribute takes the template
    /// name, so nothing else on the object may hold it.
    fn name_or_id_conflict<'a>(
        &self,
        attr: &'a ObjectAttribute,
        claims: &mut Claims,
        check_id: bool,
    ) -> Option<AttrOutcome<'a>> {
        let index = self.index;
        let hit = check_id
            .then(|| index.free_by_property_id(&attr.property_id, claims))
            .flatten()
            .map(|pos| (pos, ConflictField::PropertyId))
            .or_else(|| {
                index
                    .by_name(&attr.property_name)
                    .map(|pos| (pos, ConflictField::PropertyName))
            })?;

        let (pos, field) = hit;
        claims.claim(pos);
        debug!(
            "attribute {} conflicts with `{}` on {}",
            attr.id,
            index.attr(pos).property_id,
            field
        );
        Some(AttrOutcome::Conflict {
            index: pos,
            attr,
            field,
        })
    }
}

fn conflict_error(attr: &ObjectAttribute, field: ConflictField, property_id: &str) -> CompareError {
    CompareError::AttrConflict {
        attr_id: attr.id,
        field,
        property_id: property_id.to_string(),
    }
}
