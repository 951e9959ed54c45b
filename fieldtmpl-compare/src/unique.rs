//! Unique comparator.
//!
//! Same priority order as attributes: template identity first, then the
//! canonical key. Any live unique left over is checked for subset or
//! superset overlap with the template uniques not yet claimed.

use crate::diff::{
    UniqueConflict, UniqueCreate, UniqueDiff, UniqueSyncPlan, UniqueUnchanged, UniqueUpdate,
};
use crate::normalize::canonical_key;
use crate::{
    CompareError, CompareMode, CompareResult, Comparison, SyncStatus, UniqueComparison, UniqueIndex,
};
use fieldtmpl_model::{ObjectUnique, TemplateBinding};
use fieldtmpl_types::{ObjectId, TemplateUniqueId};
use std::collections::HashSet;
use std::ops::ControlFlow;
use tracing::debug;

/// A live unique with its attribute-id keys resolved to property ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnique {
    pub unique: ObjectUnique,
    /// Property ids, sorted.
    pub keys: Vec<String>,
    pub canonical: String,
}

impl ResolvedUnique {
    pub fn new(unique: ObjectUnique, mut keys: Vec<String>) -> Self {
        keys.sort_unstable();
        let canonical = canonical_key(&keys);
        Self {
            unique,
            keys,
            canonical,
        }
    }
}

/// One classification made by the resolution core.
#[derive(Debug, Clone, PartialEq)]
pub enum UniqueOutcome<'a> {
    Create {
        index: usize,
    },
    /// Live unique must take the keys of template unique `index`, and
    /// possibly start tracking it.
    Update {
        index: usize,
        unique: &'a ResolvedUnique,
        bind: Option<TemplateUniqueId>,
    },
    Detach {
        unique: &'a ResolvedUnique,
    },
    Conflict {
        index: usize,
        unique: &'a ResolvedUnique,
    },
    Unchanged {
        index: Option<usize>,
        unique: &'a ResolvedUnique,
    },
}

/// Compares live uniques of one object against a [`UniqueIndex`].
#[derive(Debug, Clone, Copy)]
pub struct UniqueComparator<'i> {
    index: &'i UniqueIndex,
    foreign: Option<&'i HashSet<TemplateUniqueId>>,
}

impl<'i> UniqueComparator<'i> {
    pub fn new(index: &'i UniqueIndex) -> Self {
        Self {
            index,
            foreign: None,
        }
    }

    /// Template unique ids owned by other templates bound to the same object.
    pub fn with_foreign(mut self, foreign: &'i HashSet<TemplateUniqueId>) -> Self {
        self.foreign = Some(foreign);
        self
    }

    pub fn compare(
        &self,
        object_id: ObjectId,
        live: &[ResolvedUnique],
        mode: CompareMode,
    ) -> CompareResult<UniqueComparison> {
        Ok(match mode {
            CompareMode::Ui => Comparison::Diff(self.diff(live)),
            CompareMode::BackendFull => Comparison::Plan(self.plan(live)?),
            CompareMode::BackendPartial => Comparison::Status(self.status(object_id, live)),
        })
    }

    pub fn diff(&self, live: &[ResolvedUnique]) -> UniqueDiff {
        let mut diff = UniqueDiff::default();
        let _ = self.resolve(live, CompareMode::Ui, |outcome| {
            match outcome {
                UniqueOutcome::Create { index } => diff.create.push(self.create_entry(index)),
                UniqueOutcome::Update {
                    index,
                    unique,
                    bind,
                } => diff.update.push(self.update_entry(index, unique, bind)),
                UniqueOutcome::Conflict { index, unique } => {
                    let key = self.index.unique(index).canonical.clone();
                    let message = conflict_error(unique, &key).to_string();
                    diff.conflict.push(UniqueConflict {
                        index,
                        key,
                        message,
                        unique: unique.unique.clone(),
                    });
                }
                UniqueOutcome::Detach { unique } => diff.unchanged.push(UniqueUnchanged {
                    index: None,
                    unique: unique.unique.clone(),
                }),
                UniqueOutcome::Unchanged { index, unique } => {
                    diff.unchanged.push(UniqueUnchanged {
                        index,
                        unique: unique.unique.clone(),
                    })
                }
            }
            ControlFlow::<()>::Continue(())
        });
        diff
    }

    /// Plan for unattended sync. Fails on the first overlapping live unique.
    pub fn plan(&self, live: &[ResolvedUnique]) -> CompareResult<UniqueSyncPlan> {
        let mut plan = UniqueSyncPlan::default();
        let flow = self.resolve(live, CompareMode::BackendFull, |outcome| {
            match outcome {
                UniqueOutcome::Create { index } => plan.create.push(self.create_entry(index)),
                UniqueOutcome::Update {
                    index,
                    unique,
                    bind,
                } => plan.update.push(self.update_entry(index, unique, bind)),
                UniqueOutcome::Detach { unique } => plan.update.push(UniqueUpdate {
                    index: None,
                    unique: unique.unique.clone(),
                    keys: unique.keys.clone(),
                    template_id: Some(TemplateBinding::Unbind),
                }),
                UniqueOutcome::Conflict { index, unique } => {
                    let key = &self.index.unique(index).canonical;
                    return ControlFlow::Break(conflict_error(unique, key));
                }
                UniqueOutcome::Unchanged { .. } => {}
            }
            ControlFlow::Continue(())
        });

        match flow {
            ControlFlow::Break(err) => Err(err),
            ControlFlow::Continue(()) => Ok(plan),
        }
    }

    /// Whether the object's uniques need sync. Stops at the first difference.
    pub fn status(&self, object_id: ObjectId, live: &[ResolvedUnique]) -> SyncStatus {
        let flow = self.resolve(live, CompareMode::BackendPartial, |outcome| match outcome {
            UniqueOutcome::Unchanged { .. } => ControlFlow::Continue(()),
            _ => ControlFlow::Break(()),
        });
        SyncStatus {
            object_id,
            need_sync: flow.is_break(),
        }
    }

    fn create_entry(&self, index: usize) -> UniqueCreate {
        UniqueCreate {
            index,
            keys: self.index.unique(index).keys.clone(),
        }
    }

    fn update_entry(
        &self,
        index: usize,
        unique: &ResolvedUnique,
        bind: Option<TemplateUniqueId>,
    ) -> UniqueUpdate {
        UniqueUpdate {
            index: Some(index),
            unique: unique.unique.clone(),
            keys: self.index.unique(index).keys.clone(),
            template_id: bind.map(TemplateBinding::Bind),
        }
    }

    fn is_foreign(&self, id: TemplateUniqueId) -> bool {
        self.foreign.is_some_and(|f| f.contains(&id))
    }

    pub(crate) fn resolve<'a, B>(
        &self,
        live: &'a [ResolvedUnique],
        mode: CompareMode,
        mut emit: impl FnMut(UniqueOutcome<'a>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let backend = mode.is_backend();
        let index = self.index;
        let mut claims = index.claims();

        let mut orphans = Vec::new();
        let mut unmanaged = Vec::new();
        for unique in live {
            match unique.unique.template_id {
                Some(tid) => match index.free_by_id(tid, &claims) {
                    Some(pos) => {
                        claims.claim(pos);
                        let tmpl = index.unique(pos);
                        if tmpl.canonical == unique.canonical {
                            emit(UniqueOutcome::Unchanged {
                                index: Some(pos),
                                unique,
                            })?;
                        } else {
                            emit(UniqueOutcome::Update {
                                index: pos,
                                unique,
                                bind: None,
                            })?;
                        }
                    }
                    None => orphans.push((tid, unique)),
                },
                None => unmanaged.push(unique),
            }
        }

        for (tid, unique) in orphans {
            if let Some(pos) = index.free_conflicting(&unique.keys, &unique.canonical, &claims) {
                claims.claim(pos);
                debug!(
                    "unique {} overlaps template unique `{}`",
                    unique.unique.id,
                    index.unique(pos).canonical
                );
                emit(UniqueOutcome::Conflict { index: pos, unique })?;
            } else if self.is_foreign(tid) || !backend {
                emit(UniqueOutcome::Unchanged {
                    index: None,
                    unique,
                })?;
            } else {
                debug!("unique {} lost template unique {}, detaching", unique.unique.id, tid);
                emit(UniqueOutcome::Detach { unique })?;
            }
        }

        let mut leftovers = Vec::new();
        for unique in unmanaged {
            match index.free_by_canonical(&unique.canonical, &claims) {
                Some(pos) => {
                    claims.claim(pos);
                    match index.unique(pos).id {
                        Some(id) if backend => emit(UniqueOutcome::Update {
                            index: pos,
                            unique,
                            bind: Some(id),
                        })?,
                        _ => emit(UniqueOutcome::Unchanged {
                            index: Some(pos),
                            unique,
                        })?,
                    }
                }
                None => leftovers.push(unique),
            }
        }

        for unique in leftovers {
            match index.free_conflicting(&unique.keys, &unique.canonical, &claims) {
                Some(pos) => {
                    claims.claim(pos);
                    debug!(
                        "unique {} overlaps template unique `{}`",
                        unique.unique.id,
                        index.unique(pos).canonical
                    );
                    emit(UniqueOutcome::Conflict { index: pos, unique })?;
                }
                None => emit(UniqueOutcome::Unchanged {
                    index: None,
                    unique,
                })?,
            }
        }

        for pos in claims.unclaimed() {
            emit(UniqueOutcome::Create { index: pos })?;
        }
        ControlFlow::Continue(())
    }
}

fn conflict_error(unique: &ResolvedUnique, key: &str) -> CompareError {
    CompareError::UniqueConflict {
        unique_id: unique.unique.id,
        key: key.to_string(),
    }
}
