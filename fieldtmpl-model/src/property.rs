use serde::{Deserialize, Serialize};
use std::fmt;

/// The data type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    SingleChar,
    LongChar,
    Int,
    Float,
    Enum,
    EnumMulti,
    EnumQuote,
    Date,
    Time,
    Timezone,
    Bool,
    List,
    Organization,
    ObjUser,
    Table,
    InnerTable,
}

impl PropertyType {
    /// Wire name, as used in stored schemas.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleChar => "singlechar",
            Self::LongChar => "longchar",
            Self::Int => "int",
            Self::Float => "float",
            Self::Enum => "enum",
            Self::EnumMulti => "enummulti",
            Self::EnumQuote => "enumquote",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timezone => "timezone",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Organization => "organization",
            Self::ObjUser => "objuser",
            Self::Table => "table",
            Self::InnerTable => "innertable",
        }
    }

    /// Whether an attribute of this type may be a key of a unique constraint.
    ///
    /// A single-key unique only accepts short text and numbers; composite
    /// uniques additionally accept dates and lists.
    pub fn is_unique_key(self, single: bool) -> bool {
        match self {
            Self::SingleChar | Self::Int | Self::Float => true,
            Self::Date | Self::List => !single,
            _ => false,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
