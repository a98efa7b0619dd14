//! Cards and their tag sets
//!
//! A card is an opaque identifier plus an immutable set of tags. Tag sets
//! are stored as sorted, deduplicated vectors of interned IDs: comparison
//! and hashing are cheap, membership is a binary search, and the sorted
//! order makes canonical hashing trivial.

use serde::{Deserialize, Serialize};

use crate::types::{CardId, TagId};

/// An immutable set of interned tags
///
/// Sorted by ID, no duplicates. Insertion order of the source tags is
/// irrelevant by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TagSet {
    /// Sorted, deduplicated tag IDs
    tags: Vec<TagId>,
}

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a vector of IDs (sorted and deduplicated)
    pub fn from_ids(mut tags: Vec<TagId>) -> Self {
        tags.sort();
        tags.dedup();
        Self { tags }
    }

    /// Check membership of a single tag
    pub fn contains(&self, tag: TagId) -> bool {
        self.tags.binary_search(&tag).is_ok()
    }

    /// Check that every given tag is present (I ⊆ tags)
    pub fn contains_all(&self, tags: &[TagId]) -> bool {
        tags.iter().all(|&t| self.contains(t))
    }

    /// Check that at least one given tag is present (O ∩ tags ≠ ∅)
    pub fn intersects(&self, tags: &[TagId]) -> bool {
        tags.iter().any(|&t| self.contains(t))
    }

    /// All tags as a slice, sorted ascending
    pub fn as_slice(&self) -> &[TagId] {
        &self.tags
    }

    /// Iterate over the tags
    pub fn iter(&self) -> impl Iterator<Item = &TagId> {
        self.tags.iter()
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<TagId> for TagSet {
    fn from_iter<I: IntoIterator<Item = TagId>>(iter: I) -> Self {
        Self::from_ids(iter.into_iter().collect())
    }
}

/// A card: stable identifier plus its tag set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Interned stable identifier
    pub id: CardId,

    /// The card's tags
    pub tags: TagSet,
}

impl Card {
    /// Create a new card
    pub fn new(id: CardId, tags: TagSet) -> Self {
        Self { id, tags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagset_sorts_and_dedups() {
        let set = TagSet::from_ids(vec![TagId(3), TagId(1), TagId(3), TagId(2)]);
        assert_eq!(set.as_slice(), &[TagId(1), TagId(2), TagId(3)]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_tagset_order_irrelevant() {
        let a = TagSet::from_ids(vec![TagId(1), TagId(2)]);
        let b = TagSet::from_ids(vec![TagId(2), TagId(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_contains_all() {
        let set = TagSet::from_ids(vec![TagId(1), TagId(2), TagId(3)]);
        assert!(set.contains_all(&[TagId(1), TagId(3)]));
        assert!(!set.contains_all(&[TagId(1), TagId(4)]));
        // Vacuous truth for the empty requirement
        assert!(set.contains_all(&[]));
    }

    #[test]
    fn test_intersects() {
        let set = TagSet::from_ids(vec![TagId(1), TagId(2)]);
        assert!(set.intersects(&[TagId(2), TagId(9)]));
        assert!(!set.intersects(&[TagId(8), TagId(9)]));
        assert!(!set.intersects(&[]));
    }

    #[test]
    fn test_empty_tagset() {
        let set = TagSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(TagId(0)));
        assert!(set.contains_all(&[]));
        assert!(!set.intersects(&[TagId(0)]));
    }
}
