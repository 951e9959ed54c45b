use serde::{Deserialize, Serialize};

/// Naming rules applied to template attributes before any comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Property id prefix reserved for built-in attributes.
    pub reserved_prefix: String,
    /// Internal fields every object carries; templates may not redefine them.
    pub reserved_fields: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: "bk".to_string(),
            reserved_fields: ["creator", "create_time", "modifier", "last_time"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl CompareConfig {
    pub(crate) fn is_reserved_prefix(&self, property_id: &str) -> bool {
        !self.reserved_prefix.is_empty() && property_id.starts_with(&self.reserved_prefix)
    }

    pub(crate) fn is_reserved_field(&self, property_id: &str) -> bool {
        self.reserved_fields.iter().any(|f| f == property_id)
    }
}
