//! Async layer of the field template engine.
//!
//! Wires the pure comparison core to the outside world:
//!
//! - **Store traits** ([`TemplateStore`], [`ModelStore`], [`TaskExecutor`]):
//!   what the engine reads and where computed plans go
//! - **[`MemoryStore`]**: reference implementation over a JSON [`Snapshot`]
//! - **[`FieldTemplateService`]**: single-object diffs, sync status, and
//!   sync planning
//! - **[`SyncStatusAggregator`]**: many objects at once with bounded
//!   concurrency
//!
//! # Example
//!
//! ```
//! use fieldtmpl_sync::{EngineConfig, FieldTemplateService, MemoryStore, SyncStatusAggregator};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = Arc::new(FieldTemplateService::with_store(store, EngineConfig::default()));
//! let aggregator = SyncStatusAggregator::new(service);
//! ```

mod config;
mod error;
mod memory;
mod service;
mod status;
pub mod store;

pub use config::EngineConfig;
pub use error::{SyncError, SyncResult};
pub use memory::{MemoryStore, Snapshot};
pub use service::{FieldTemplateService, ObjectUniquePlan, PreparedTemplate, TemplateReview};
pub use status::SyncStatusAggregator;
pub use store::{
    AttrFilter, AttrScope, BindingFilter, ModelStore, SyncTask, TaskExecutor, TemplateStore,
};
