use fieldtmpl_compare::CompareConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the template service and the status aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on objects checked at the same time.
    pub max_concurrency: usize,
    /// Naming rules for template attributes.
    pub compare: CompareConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            compare: CompareConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Concurrency actually used; never zero.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
