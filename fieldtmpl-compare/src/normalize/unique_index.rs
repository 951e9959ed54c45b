use super::Claims;
use crate::{CompareError, CompareResult};
use fieldtmpl_model::{FieldTemplateAttr, TemplateUniqueKeys};
use fieldtmpl_types::TemplateUniqueId;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Canonical form of a composite key: sorted property ids joined by `,`.
/// Two uniques with equal canonical keys are the same constraint.
pub fn canonical_key<S: AsRef<str>>(keys: &[S]) -> String {
    let mut sorted: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

/// Whether one key set is a non-strict subset of the other.
///
/// Such constraints are ambiguous: the narrower one already implies the
/// wider one, so they cannot coexist as independent rules.
pub fn keys_conflict<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    let a: HashSet<&str> = a.iter().map(AsRef::as_ref).collect();
    let b: HashSet<&str> = b.iter().map(AsRef::as_ref).collect();
    a.is_subset(&b) || b.is_subset(&a)
}

/// One template unique as indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedUnique {
    pub id: Option<TemplateUniqueId>,
    /// Property ids, sorted.
    pub keys: Vec<String>,
    pub canonical: String,
}

/// Validated template uniques with lookups by id, canonical key and key member.
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    uniques: Vec<IndexedUnique>,
    by_id: HashMap<TemplateUniqueId, usize>,
    by_canonical_key: HashMap<String, usize>,
    by_key_member: HashMap<String, Vec<usize>>,
}

impl UniqueIndex {
    /// Validates `uniques` and indexes them.
    ///
    /// Rejects empty key sets, repeated keys, and any two uniques whose key
    /// sets are equal or contain one another.
    pub fn build(uniques: Vec<TemplateUniqueKeys>) -> CompareResult<Self> {
        let mut index = Self {
            uniques: Vec::with_capacity(uniques.len()),
            by_id: HashMap::new(),
            by_canonical_key: HashMap::with_capacity(uniques.len()),
            by_key_member: HashMap::new(),
        };

        for (pos, unique) in uniques.into_iter().enumerate() {
            if unique.keys.is_empty() {
                warn!("template unique #{} has no keys", pos);
                return Err(CompareError::EmptyUniqueKeys { index: pos });
            }

            let mut keys = unique.keys;
            keys.sort_unstable();
            if let Some(dup) = keys.windows(2).find(|w| w[0] == w[1]) {
                warn!("template unique #{} repeats key `{}`", pos, dup[0]);
                return Err(CompareError::DuplicateUniqueKey {
                    index: pos,
                    key: dup[0].clone(),
                });
            }
            let canonical = keys.join(",");

            if index.by_canonical_key.contains_key(&canonical) {
                warn!("template unique `{}` is duplicated", canonical);
                return Err(CompareError::AmbiguousUniques {
                    first: canonical.clone(),
                    second: canonical,
                });
            }
            for key in &keys {
                for &other in index.by_key_member.get(key).into_iter().flatten() {
                    let other = &index.uniques[other];
                    if keys_conflict(&keys, &other.keys) {
                        warn!("template uniques `{}` and `{}` overlap", other.canonical, canonical);
                        return Err(CompareError::AmbiguousUniques {
                            first: other.canonical.clone(),
                            second: canonical,
                        });
                    }
                }
            }

            for key in &keys {
                index.by_key_member.entry(key.clone()).or_default().push(pos);
            }
            if let Some(id) = unique.id
                && index.by_id.insert(id, pos).is_some()
            {
                warn!("template unique id {} is duplicated", id);
                return Err(CompareError::DuplicateUniqueId(id));
            }
            index.by_canonical_key.insert(canonical.clone(), pos);
            index.uniques.push(IndexedUnique {
                id: unique.id,
                keys,
                canonical,
            });
        }

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.uniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniques.is_empty()
    }

    /// Uniques in template order.
    pub fn uniques(&self) -> &[IndexedUnique] {
        &self.uniques
    }

    pub fn get(&self, pos: usize) -> Option<&IndexedUnique> {
        self.uniques.get(pos)
    }

    pub(crate) fn unique(&self, pos: usize) -> &IndexedUnique {
        &self.uniques[pos]
    }

    pub(crate) fn claims(&self) -> Claims {
        Claims::new(self.uniques.len())
    }

    pub(crate) fn free_by_id(&self, id: TemplateUniqueId, claims: &Claims) -> Option<usize> {
        self.by_id.get(&id).copied().filter(|&p| claims.is_free(p))
    }

    pub(crate) fn free_by_canonical(&self, canonical: &str, claims: &Claims) -> Option<usize> {
        self.by_canonical_key
            .get(canonical)
            .copied()
            .filter(|&p| claims.is_free(p))
    }

    /// First unclaimed template unique that `keys` is ambiguous with.
    pub(crate) fn free_conflicting(
        &self,
        keys: &[String],
        canonical: &str,
        claims: &Claims,
    ) -> Option<usize> {
        if let Some(pos) = self.free_by_canonical(canonical, claims) {
            return Some(pos);
        }
        keys.iter()
            .filter_map(|key| self.by_key_member.get(key))
            .flatten()
            .copied()
            .find(|&pos| claims.is_free(pos) && keys_conflict(keys, &self.uniques[pos].keys))
    }
}

/// Checks that every unique key names a template attribute whose type may
/// back a unique of that arity.
pub fn validate_unique_key_types(
    uniques: &[TemplateUniqueKeys],
    attrs: &[FieldTemplateAttr],
) -> CompareResult<()> {
    let types: HashMap<&str, _> = attrs
        .iter()
        .map(|a| (a.property_id.as_str(), a.property_type))
        .collect();

    for unique in uniques {
        let single = unique.keys.len() == 1;
        for key in &unique.keys {
            let Some(&property_type) = types.get(key.as_str()) else {
                warn!("unique key `{}` is not a template attribute", key);
                return Err(CompareError::UnknownUniqueKey(key.clone()));
            };
            if !property_type.is_unique_key(single) {
                warn!("unique key `{}` has non-unique type {}", key, property_type);
                return Err(CompareError::InvalidUniqueKeyType {
                    key: key.clone(),
                    property_type,
                });
            }
        }
    }
    Ok(())
}
