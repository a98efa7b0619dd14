//! Tag interning and selectivity statistics
//!
//! Tag names are interned to compact `u32` IDs on first use. The interner
//! also tracks per-tag usage counts (how many cards currently bear the
//! tag), which drive selectivity ordering: during intersection the rarest
//! tag is applied first, so intermediate sets shrink as fast as possible.
//!
//! # Thread Safety
//!
//! Interior mutability with `RwLock`; lookups of already-interned names
//! take only the read lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::TagId;

/// A thread-safe tag interner with usage statistics
///
/// Maps tag names to compact IDs and back. Once a name is interned its ID
/// remains valid for the lifetime of the interner; a tag whose usage count
/// drops to zero is tombstoned (count zero, ID retained), never removed,
/// so the name↔ID bijection holds until an explicit rebuild.
#[derive(Debug, Default)]
pub struct TagInterner {
    /// Forward map: name -> ID
    name_to_id: RwLock<HashMap<String, TagId>>,

    /// Reverse map plus usage count, indexed by ID
    entries: RwLock<Vec<TagEntry>>,
}

#[derive(Debug)]
struct TagEntry {
    name: String,
    usage_count: u64,
}

impl TagInterner {
    /// Create a new empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name_to_id: RwLock::new(HashMap::with_capacity(capacity)),
            entries: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Intern a tag name, returning its ID
    ///
    /// Returns the existing ID if the name was seen before. O(1) amortized.
    pub fn get_or_create_id(&self, name: &str) -> TagId {
        // Fast path: already interned (read lock only)
        {
            let map = self.name_to_id.read();
            if let Some(&id) = map.get(name) {
                return id;
            }
        }

        let mut map = self.name_to_id.write();

        // Double-check after acquiring the write lock
        if let Some(&id) = map.get(name) {
            return id;
        }

        let mut entries = self.entries.write();
        let id = TagId(entries.len() as u32);
        entries.push(TagEntry {
            name: name.to_string(),
            usage_count: 0,
        });
        map.insert(name.to_string(), id);
        id
    }

    /// Get the ID for a name if it exists, without interning
    ///
    /// `None` is the explicit "unknown tag" result; callers treat it as an
    /// empty match, never an error.
    pub fn id(&self, name: &str) -> Option<TagId> {
        self.name_to_id.read().get(name).copied()
    }

    /// Resolve an ID back to its name
    pub fn resolve(&self, id: TagId) -> Option<String> {
        self.entries
            .read()
            .get(id.0 as usize)
            .map(|e| e.name.clone())
    }

    /// Current cardinality of a tag (number of cards bearing it)
    pub fn usage_count(&self, id: TagId) -> u64 {
        self.entries
            .read()
            .get(id.0 as usize)
            .map(|e| e.usage_count)
            .unwrap_or(0)
    }

    /// Record that a card gained this tag
    pub fn increment_usage(&self, id: TagId) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(id.0 as usize) {
            entry.usage_count += 1;
        }
    }

    /// Record that a card lost this tag
    ///
    /// Saturates at zero; a zero-count tag is a tombstone, its ID stays
    /// reserved.
    pub fn decrement_usage(&self, id: TagId) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(id.0 as usize) {
            entry.usage_count = entry.usage_count.saturating_sub(1);
        }
    }

    /// Sort tags ascending by usage count (rarest first)
    ///
    /// The intersection phase applies tags in this order so the most
    /// restrictive tag anchors the chain. O(k log k) for k tags. Ties
    /// break on ID for deterministic output.
    pub fn selectivity_order(&self, tags: &[TagId]) -> Vec<TagId> {
        let entries = self.entries.read();
        let count = |id: TagId| {
            entries
                .get(id.0 as usize)
                .map(|e| e.usage_count)
                .unwrap_or(0)
        };

        let mut ordered: Vec<TagId> = tags.to_vec();
        ordered.sort_by_key(|&id| (count(id), id));
        ordered
    }

    /// Number of interned tags (tombstones included)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if no tags have been interned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
