//! Identifier types used throughout the engine.
//!
//! Store ids are positive integers. Zero is never a valid persisted id, so
//! "not yet persisted" and "not bound" are expressed with `Option` at the
//! use site instead of a sentinel.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store id.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw store id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Parses an id from a string, rejecting zero and negatives.
            pub fn parse(s: &str) -> Result<Self, Error> {
                s.parse()
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: i64 = s.trim().parse().map_err(|e: std::num::ParseIntError| {
                    Error::InvalidId {
                        value: s.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                if raw <= 0 {
                    return Err(Error::InvalidId {
                        value: s.to_string(),
                        reason: "must be positive".to_string(),
                    });
                }
                Ok(Self(raw))
            }
        }
    };
}

store_id! {
    /// Identifier of a field template.
    TemplateId
}

store_id! {
    /// Identifier of one attribute definition inside a field template.
    /// Live attributes reference it through their `template_id`.
    TemplateAttrId
}

store_id! {
    /// Identifier of one unique constraint definition inside a field template.
    TemplateUniqueId
}

store_id! {
    /// Identifier of an object model (the numeric id, not the string key).
    ObjectId
}

store_id! {
    /// Identifier of a live object attribute.
    AttrId
}

store_id! {
    /// Identifier of a live object unique constraint.
    UniqueId
}

store_id! {
    /// Identifier of a business scope owning custom attributes.
    BizId
}

/// Handle for a sync task queued on the external executor.
///
/// Minted when a plan is enqueued and echoed back by the executor in its
/// status reports. v7 UUIDs keep tasks in enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Mints the handle for a task about to be enqueued.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps a task handle the executor reported back.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Reads a task handle from executor output.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.parse()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}
