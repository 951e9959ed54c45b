//! Template pre-check and indexing.
//!
//! A template is validated once and turned into immutable lookup indices.
//! Each comparison then tracks which entries it has claimed in its own
//! small working set, so one index can serve many comparisons at once.

mod attr_index;
mod unique_index;

pub use attr_index::AttrIndex;
pub use unique_index::{
    canonical_key, keys_conflict, validate_unique_key_types, IndexedUnique, UniqueIndex,
};

/// Entries of an index already matched (or claimed by a conflict) during
/// one comparison. Claimed entries are invisible to every lookup.
#[derive(Debug, Clone)]
pub(crate) struct Claims(Vec<bool>);

impl Claims {
    pub(crate) fn new(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub(crate) fn claim(&mut self, pos: usize) {
        self.0[pos] = true;
    }

    pub(crate) fn is_free(&self, pos: usize) -> bool {
        !self.0[pos]
    }

    /// Positions never claimed, in ascending order.
    pub(crate) fn unclaimed(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(pos, claimed)| (!claimed).then_some(pos))
    }
}
