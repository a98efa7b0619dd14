//! Bitmap index for the turbo execution tier
//!
//! Each tag gets a bitmap over dense card IDs: bit `i` of tag `t`'s bitmap
//! is set iff the card with dense ID `i` currently has `t`. Intersection,
//! union, and exclusion then become AND / OR / AND-NOT over 64-bit words.
//!
//! The index is valid for exactly one universe generation. It is built
//! lazily on the first turbo-tier request for a generation and discarded
//! when the generation changes; the dense-ID mapping is rebuilt wholesale
//! rather than patched.
//!
//! # Performance
//!
//! - Single tag lookup: O(1)
//! - Multi-tag AND/OR: O(n/64) word operations
//! - Memory: ~1 bit per card per distinct tag

use std::collections::HashMap;

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use crate::types::{DenseId, Generation, TagId};
use crate::universe::UniverseSnapshot;

/// A bitmap over dense card IDs
///
/// A vector of u64 words, one bit per card. Dense IDs start at zero per
/// generation, so the bitmap is compact by construction.
#[derive(Debug, Clone, Default)]
pub struct CardBitmap {
    /// Bitmap words (64 bits each)
    words: Vec<u64>,

    /// Number of bits set (cached for fast cardinality)
    cardinality: usize,
}

impl CardBitmap {
    /// Create an empty bitmap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bitmap with capacity for `num_cards` bits
    pub fn with_capacity(num_cards: usize) -> Self {
        Self {
            words: vec![0; num_cards.div_ceil(64)],
            cardinality: 0,
        }
    }

    /// Set a bit
    pub fn set(&mut self, id: DenseId) {
        let idx = id.0 as usize;
        let word_idx = idx / 64;
        let bit_idx = idx % 64;

        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }

        let mask = 1u64 << bit_idx;
        if self.words[word_idx] & mask == 0 {
            self.words[word_idx] |= mask;
            self.cardinality += 1;
        }
    }

    /// Check if a bit is set
    pub fn contains(&self, id: DenseId) -> bool {
        let idx = id.0 as usize;
        let word_idx = idx / 64;

        if word_idx >= self.words.len() {
            return false;
        }

        (self.words[word_idx] & (1u64 << (idx % 64))) != 0
    }

    /// Number of bits set
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Check if no bits are set
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    /// Bitwise AND (intersection)
    pub fn and(&self, other: &CardBitmap) -> CardBitmap {
        let min_len = self.words.len().min(other.words.len());
        let mut words = Vec::with_capacity(min_len);
        let mut cardinality = 0;

        for i in 0..min_len {
            let word = self.words[i] & other.words[i];
            words.push(word);
            cardinality += word.count_ones() as usize;
        }

        CardBitmap { words, cardinality }
    }

    /// Bitwise OR (union)
    pub fn or(&self, other: &CardBitmap) -> CardBitmap {
        let max_len = self.words.len().max(other.words.len());
        let mut words = Vec::with_capacity(max_len);
        let mut cardinality = 0;

        for i in 0..max_len {
            let w1 = self.words.get(i).copied().unwrap_or(0);
            let w2 = other.words.get(i).copied().unwrap_or(0);
            let word = w1 | w2;
            words.push(word);
            cardinality += word.count_ones() as usize;
        }

        CardBitmap { words, cardinality }
    }

    /// Bitwise AND-NOT (difference: self AND NOT other)
    pub fn and_not(&self, other: &CardBitmap) -> CardBitmap {
        let mut words = Vec::with_capacity(self.words.len());
        let mut cardinality = 0;

        for i in 0..self.words.len() {
            let w2 = other.words.get(i).copied().unwrap_or(0);
            let word = self.words[i] & !w2;
            words.push(word);
            cardinality += word.count_ones() as usize;
        }

        CardBitmap { words, cardinality }
    }

    /// Iterate over all set bits
    pub fn iter(&self) -> BitmapIter<'_> {
        BitmapIter {
            bitmap: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }

    /// Memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.words.len() * 8
    }
}

/// Iterator over set bits in a bitmap
pub struct BitmapIter<'a> {
    bitmap: &'a CardBitmap,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for BitmapIter<'_> {
    type Item = DenseId;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.bitmap.words.len() {
            let word = self.bitmap.words[self.word_idx];

            while self.bit_idx < 64 {
                if (word & (1u64 << self.bit_idx)) != 0 {
                    let id = DenseId((self.word_idx * 64 + self.bit_idx) as u32);
                    self.bit_idx += 1;
                    return Some(id);
                }
                self.bit_idx += 1;
            }

            self.word_idx += 1;
            self.bit_idx = 0;
        }

        None
    }
}

/// Per-generation bitmap index: one bitmap per tag, plus an all-cards mask
#[derive(Debug)]
pub struct BitmapIndex {
    /// Generation this index was built for
    generation: Generation,

    /// Per-tag bitmaps
    bitmaps: HashMap<TagId, CardBitmap>,

    /// Every dense ID in the snapshot
    all_cards: CardBitmap,
}

impl BitmapIndex {
    /// Build the index from a universe snapshot
    ///
    /// One pass over the cards; each card sets its bit in every bitmap of
    /// a tag it carries.
    pub fn build(snapshot: &UniverseSnapshot) -> Self {
        let num_cards = snapshot.len();
        let mut bitmaps: HashMap<TagId, CardBitmap> = HashMap::new();
        let mut all_cards = CardBitmap::with_capacity(num_cards);

        for (dense_id, card) in snapshot.cards_by_dense_id() {
            all_cards.set(dense_id);
            for &tag in card.tags.iter() {
                bitmaps
                    .entry(tag)
                    .or_insert_with(|| CardBitmap::with_capacity(num_cards))
                    .set(dense_id);
            }
        }

        debug!(
            generation = snapshot.generation().0,
            cards = num_cards,
            tags = bitmaps.len(),
            "built bitmap index"
        );

        Self {
            generation: snapshot.generation(),
            bitmaps,
            all_cards,
        }
    }

    /// The generation this index is valid for
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Bitmap for a tag; `None` if no card in this generation has it
    pub fn bitmap(&self, tag: TagId) -> Option<&CardBitmap> {
        self.bitmaps.get(&tag)
    }

    /// Bitmap covering every card in the snapshot
    pub fn all_cards(&self) -> &CardBitmap {
        &self.all_cards
    }

    /// Total memory held by the bitmaps, in bytes
    pub fn memory_bytes(&self) -> usize {
        self.bitmaps.values().map(|b| b.memory_bytes()).sum::<usize>()
            + self.all_cards.memory_bytes()
    }
}

/// Lazily-built, generation-checked holder for the turbo tier's index
///
/// The writer never blocks on index builds: the index is constructed on
/// the first turbo request that observes a new generation, and the stale
/// one is dropped at that moment.
#[derive(Debug, Default)]
pub struct BitmapIndexCache {
    current: RwLock<Option<Arc<BitmapIndex>>>,
}

impl BitmapIndexCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the index for the snapshot's generation, building it if needed
    pub fn get_or_build(&self, snapshot: &UniverseSnapshot) -> Arc<BitmapIndex> {
        {
            let guard = self.current.read();
            if let Some(index) = guard.as_ref() {
                if index.generation() == snapshot.generation() {
                    return Arc::clone(index);
                }
            }
        }

        let mut guard = self.current.write();
        // Another thread may have built it while we waited for the lock
        if let Some(index) = guard.as_ref() {
            if index.generation() == snapshot.generation() {
                return Arc::clone(index);
            }
        }

        let index = Arc::new(BitmapIndex::build(snapshot));
        *guard = Some(Arc::clone(&index));
        index
    }
}
