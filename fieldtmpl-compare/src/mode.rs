use crate::{AttrDiff, AttrSyncPlan, SyncStatus, UniqueDiff, UniqueSyncPlan};
use serde::{Deserialize, Serialize};

/// How much a comparison reports and how it treats conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Every classification, conflicts included, for human review.
    Ui,
    /// Create/update plan for unattended sync; any conflict is an error.
    BackendFull,
    /// Stop at the first difference and report whether sync is needed.
    BackendPartial,
}

impl CompareMode {
    /// Backend modes bind unmanaged matches and detach orphans.
    pub fn is_backend(self) -> bool {
        !matches!(self, Self::Ui)
    }
}

/// Mode-dependent result of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "result")]
pub enum Comparison<D, P> {
    Diff(D),
    Plan(P),
    Status(SyncStatus),
}

pub type AttrComparison = Comparison<AttrDiff, AttrSyncPlan>;
pub type UniqueComparison = Comparison<UniqueDiff, UniqueSyncPlan>;

impl<D, P> Comparison<D, P> {
    pub fn into_diff(self) -> Option<D> {
        match self {
            Self::Diff(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_plan(self) -> Option<P> {
        match self {
            Self::Plan(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_status(self) -> Option<SyncStatus> {
        match self {
            Self::Status(s) => Some(s),
            _ => None,
        }
    }
}
