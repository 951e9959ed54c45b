use serde::{Deserialize, Serialize};

/// A template value that may be forced onto bound objects.
///
/// When `lock` is set the template value is authoritative and any bound
/// object holding a different value must be updated. When unset the object
/// may diverge freely and the field is never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockable<T> {
    #[serde(default)]
    pub lock: bool,
    pub value: T,
}

impl<T: PartialEq + Clone> Lockable<T> {
    /// A locked value.
    pub fn locked(value: T) -> Self {
        Self { lock: true, value }
    }

    /// An unlocked value (template default only).
    pub fn unlocked(value: T) -> Self {
        Self { lock: false, value }
    }

    /// Returns the value an object must be updated to, if any.
    pub fn enforced(&self, current: &T) -> Option<T> {
        (self.lock && self.value != *current).then(|| self.value.clone())
    }
}
