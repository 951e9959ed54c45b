//! Comparison core for field templates.
//!
//! Reconciles one template's attributes and unique constraints against the
//! live schema of one object model and classifies every definition as
//! Create, Update, Conflict or Unchanged.
//!
//! # Components
//!
//! - **Normalizer** ([`AttrIndex`], [`UniqueIndex`]): validates a template and
//!   builds the lookup indices every comparison reads from.
//! - **Attribute comparator** ([`AttrComparator`]): priority-ordered identity
//!   resolution (template id, then property id, then property name).
//! - **Unique comparator** ([`UniqueComparator`]): the same priority order
//!   plus subset/superset conflict detection between composite keys.
//!
//! # Modes
//!
//! Each comparator runs one resolution core and projects its outcomes
//! through a [`CompareMode`]:
//!
//! - [`CompareMode::Ui`]: full detail for human review, conflicts are data
//! - [`CompareMode::BackendFull`]: a plan for unattended sync, conflicts are errors
//! - [`CompareMode::BackendPartial`]: stops at the first difference, yields a
//!   [`SyncStatus`]
//!
//! Everything here is synchronous and side-effect free. Indices are built
//! once and only read afterwards, so they can be shared between threads.
//!
//! # Example
//!
//! ```
//! use fieldtmpl_compare::{AttrComparator, AttrIndex, CompareConfig};
//! use fieldtmpl_model::{FieldTemplateAttr, ObjectAttribute, PropertyType};
//! use fieldtmpl_types::ObjectId;
//!
//! let template = vec![FieldTemplateAttr::new("cpu", "CPU", PropertyType::Int).with_id(1)];
//! let index = AttrIndex::build(template, &CompareConfig::default()).unwrap();
//!
//! let live = vec![
//!     ObjectAttribute::new(10, ObjectId::new(1), "cpu", PropertyType::Int)
//!         .with_template(1)
//!         .with_name("CPU"),
//! ];
//!
//! let diff = AttrComparator::new(&index).diff(&live);
//! assert!(diff.create.is_empty() && diff.update.is_empty() && diff.conflict.is_empty());
//! assert_eq!(diff.unchanged.len(), 1);
//! ```

mod attr;
mod config;
mod diff;
mod error;
mod mode;
pub mod normalize;
mod unique;

pub use attr::{AttrComparator, AttrOutcome};
pub use config::CompareConfig;
pub use diff::{
    AttrConflict, AttrCreate, AttrDiff, AttrPatch, AttrSyncPlan, AttrUnchanged, AttrUpdate,
    ConflictField, SyncStatus, UniqueConflict, UniqueCreate, UniqueDiff, UniqueSyncPlan,
    UniqueUnchanged, UniqueUpdate,
};
pub use error::{CompareError, CompareResult};
pub use mode::{AttrComparison, CompareMode, Comparison, UniqueComparison};
pub use normalize::{
    canonical_key, keys_conflict, validate_unique_key_types, AttrIndex, IndexedUnique,
    UniqueIndex,
};
pub use unique::{ResolvedUnique, UniqueComparator, UniqueOutcome};
