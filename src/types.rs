//! Core identifier types shared across the engine
//!
//! Cards and tags are referenced by compact interned IDs rather than
//! strings. The interner assigns dense `u32` IDs on first use and keeps a
//! reverse table, so set operations and bitmap indexing work on integers
//! while the external API speaks names.

use serde::{Deserialize, Serialize};

/// Interned tag identifier
///
/// Assigned on first use by the [`TagInterner`](crate::index::TagInterner)
/// and stable for the lifetime of the interner. Bijective with the tag
/// name within one universe scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(pub u32);

/// Opaque stable card identifier
///
/// Cards arrive with arbitrary external identifiers (UUID-like strings).
/// They are interned to a `CardId` once and referenced by it everywhere
/// inside the engine; the universe keeps the reverse lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

/// Dense per-generation index into bitmap space
///
/// Assigned once per universe generation, never reused within one. The
/// whole mapping is rebuilt on generation change rather than patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DenseId(pub u32);

/// Monotonically increasing universe version
///
/// Every card mutation bumps the generation as the last step of the
/// mutation. The generation is the sole basis for cache validity and
/// bitmap index freshness; wall-clock time plays no role anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation of an empty, never-mutated universe
    pub const ZERO: Generation = Generation(0);

    /// The generation following this one
    #[must_use]
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen{}", self.0)
    }
}
