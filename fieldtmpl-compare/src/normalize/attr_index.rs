use super::Claims;
use crate::{CompareConfig, CompareError, CompareResult};
use fieldtmpl_model::FieldTemplateAttr;
use fieldtmpl_types::TemplateAttrId;
use std::collections::HashMap;
use tracing::warn;

/// Validated template attributes with lookups by id, property id and name.
///
/// Positions are the attributes' indices in the original template list and
/// are what results refer back to.
#[derive(Debug, Clone)]
pub struct AttrIndex {
    attrs: Vec<FieldTemplateAttr>,
    by_id: HashMap<TemplateAttrId, usize>,
    by_property_id: HashMap<String, usize>,
    by_property_name: HashMap<String, usize>,
}

impl AttrIndex {
    /// Validates `attrs` and indexes them.
    ///
    /// Rejects malformed attributes, reserved property ids, and duplicate
    /// ids, property ids or names.
    pub fn build(attrs: Vec<FieldTemplateAttr>, config: &CompareConfig) -> CompareResult<Self> {
        let mut by_id = HashMap::new();
        let mut by_property_id = HashMap::with_capacity(attrs.len());
        let mut by_property_name = HashMap::with_capacity(attrs.len());

        for (pos, attr) in attrs.iter().enumerate() {
            let property_id = &attr.property_id;

            if let Err(reason) = attr.validate() {
                warn!("template attribute `{}` is invalid: {}", property_id, reason);
                return Err(CompareError::InvalidAttr {
                    property_id: property_id.clone(),
                    reason,
                });
            }
            if config.is_reserved_prefix(property_id) {
                warn!("template attribute `{}` has reserved prefix", property_id);
                return Err(CompareError::ReservedPrefix {
                    property_id: property_id.clone(),
                    prefix: config.reserved_prefix.clone(),
                });
            }
            if config.is_reserved_field(property_id) {
                warn!("template attribute `{}` collides with an internal field", property_id);
                return Err(CompareError::ReservedField(property_id.clone()));
            }
            if by_property_id.insert(property_id.clone(), pos).is_some() {
                warn!("template attribute `{}` is duplicated", property_id);
                return Err(CompareError::DuplicatePropertyId(property_id.clone()));
            }
            if by_property_name.insert(attr.property_name.clone(), pos).is_some() {
                warn!("template attribute name `{}` is duplicated", attr.property_name);
                return Err(CompareError::DuplicatePropertyName(attr.property_name.clone()));
            }
            if let Some(id) = attr.id
                && by_id.insert(id, pos).is_some()
            {
                warn!("template attribute id {} is duplicated", id);
                return Err(CompareError::DuplicateAttrId(id));
            }
        }

        Ok(Self {
            attrs,
            by_id,
            by_property_id,
            by_property_name,
        })
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Attributes in template order.
    pub fn attrs(&self) -> &[FieldTemplateAttr] {
        &self.attrs
    }

    pub fn get(&self, pos: usize) -> Option<&FieldTemplateAttr> {
        self.attrs.get(pos)
    }

    /// Position of a property id in the template.
    pub fn position(&self, property_id: &str) -> Option<usize> {
        self.by_property_id.get(property_id).copied()
    }

    pub(crate) fn attr(&self, pos: usize) -> &FieldTemplateAttr {
        &self.attrs[pos]
    }

    pub(crate) fn claims(&self) -> Claims {
        Claims::new(self.attrs.len())
    }

    pub(crate) fn free_by_id(&self, id: TemplateAttrId, claims: &Claims) -> Option<usize> {
        self.by_id.get(&id).copied().filter(|&p| claims.is_free(p))
    }

    pub(crate) fn free_by_property_id(&self, property_id: &str, claims: &Claims) -> Option<usize> {
        self.by_property_id
            .get(property_id)
            .copied()
            .filter(|&p| claims.is_free(p))
    }

    /// Looks a name up among all entries, claimed or not.
    pub(crate) fn by_name(&self, name: &str) -> Option<usize> {
        self.by_property_name.get(name).copied()
    }
}
