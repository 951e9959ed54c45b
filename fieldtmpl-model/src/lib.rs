//! Schema model for field templates and the object models bound to them.
//!
//! Two sides of every comparison live here:
//! - the template side: [`FieldTemplate`], [`FieldTemplateAttr`] (with its
//!   [`Lockable`] fields) and [`FieldTemplateUnique`]
//! - the live side: [`ObjectModel`], [`ObjectAttribute`] and [`ObjectUnique`]
//!
//! These are plain data types. Matching and diffing happen in
//! `fieldtmpl-compare`; reading them from a store happens in `fieldtmpl-sync`.

mod lockable;
mod object;
mod property;
mod template;

pub use lockable::Lockable;
pub use object::{ObjectAttribute, ObjectModel, ObjectUnique, TemplateBinding};
pub use property::PropertyType;
pub use template::{
    FieldTemplate, FieldTemplateAttr, FieldTemplateUnique, TemplateObjectBinding,
    TemplateUniqueKeys, MAX_PROPERTY_LEN,
};
