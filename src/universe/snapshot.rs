//! Copy-on-write card universe with generation counting
//!
//! Mutations go through [`CardUniverse`] under a single-writer lock: each
//! one builds a fresh immutable [`UniverseSnapshot`], bumps the generation
//! counter, and atomically publishes the snapshot as its last step.
//! Readers grab an `Arc` to the current snapshot and never block the
//! writer beyond the swap; an in-flight computation keeps its snapshot
//! alive regardless of later mutations.
//!
//! Dense IDs (bitmap positions) are assigned per snapshot in card
//! insertion order and are never reused within a generation; the whole
//! mapping is rebuilt on every publish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::index::TagInterner;
use crate::types::{CardId, DenseId, Generation};
use crate::universe::card::{Card, TagSet};

// ============================================================================
// Universe Snapshot
// ============================================================================

/// An immutable view of every card at one generation
///
/// Cards are stored in dense-ID order; `cards()[i]` has dense ID `i`.
#[derive(Debug)]
pub struct UniverseSnapshot {
    generation: Generation,
    cards: Vec<Card>,
    dense_by_card: HashMap<CardId, DenseId>,
    interner: Arc<TagInterner>,
}

impl UniverseSnapshot {
    fn empty(interner: Arc<TagInterner>) -> Self {
        Self {
            generation: Generation::ZERO,
            cards: Vec::new(),
            dense_by_card: HashMap::new(),
            interner,
        }
    }

    /// The generation this snapshot was published at
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The tag interner shared with the universe that published this
    ///
    /// The interner outlives snapshots and only ever grows, so resolving
    /// tag names against it is valid for any generation.
    pub fn interner(&self) -> &TagInterner {
        &self.interner
    }

    /// Number of cards in the universe
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the universe holds no cards
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All cards, in dense-ID order
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Iterate cards paired with their dense IDs
    pub fn cards_by_dense_id(&self) -> impl Iterator<Item = (DenseId, &Card)> {
        self.cards
            .iter()
            .enumerate()
            .map(|(i, c)| (DenseId(i as u32), c))
    }

    /// Look up a card by its stable ID
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.dense_by_card
            .get(&id)
            .map(|d| &self.cards[d.0 as usize])
    }

    /// Dense ID of a card in this generation
    pub fn dense_id(&self, id: CardId) -> Option<DenseId> {
        self.dense_by_card.get(&id).copied()
    }

    /// Card ID at a dense position
    pub fn card_at(&self, dense: DenseId) -> Option<CardId> {
        self.cards.get(dense.0 as usize).map(|c| c.id)
    }
}

// ============================================================================
// Universe Statistics
// ============================================================================

/// Mutation statistics for the universe
#[derive(Debug, Default)]
pub struct UniverseStats {
    /// Total mutations applied (upserts, removals, batches)
    pub mutations: AtomicU64,

    /// Cards created (first-time upserts)
    pub cards_created: AtomicU64,

    /// Cards removed
    pub cards_removed: AtomicU64,
}

/// Snapshot of universe statistics (non-atomic copy)
#[derive(Debug, Clone)]
pub struct UniverseStatsSnapshot {
    /// Total mutations applied
    pub mutations: u64,
    /// Cards created
    pub cards_created: u64,
    /// Cards removed
    pub cards_removed: u64,
}

impl UniverseStats {
    fn snapshot(&self) -> UniverseStatsSnapshot {
        UniverseStatsSnapshot {
            mutations: self.mutations.load(Ordering::Relaxed),
            cards_created: self.cards_created.load(Ordering::Relaxed),
            cards_removed: self.cards_removed.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Card Universe (writer)
// ============================================================================

/// Registry of external card identifiers
///
/// External IDs (UUID-like strings) are interned to `CardId` on first
/// sight and the assignment is permanent, so a removed-then-readded card
/// keeps its ID.
#[derive(Debug, Default)]
struct CardRegistry {
    name_to_id: HashMap<String, CardId>,
    names: Vec<String>,
}

impl CardRegistry {
    fn get_or_create(&mut self, name: &str) -> CardId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = CardId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    fn get(&self, name: &str) -> Option<CardId> {
        self.name_to_id.get(name).copied()
    }

    fn resolve(&self, id: CardId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }
}

/// Writer state, guarded by a single mutex
#[derive(Debug, Default)]
struct WriterState {
    registry: CardRegistry,
    /// Live cards in insertion order (dense order of the next snapshot)
    live: Vec<(CardId, TagSet)>,
    /// Positions into `live` for O(1) upsert
    positions: HashMap<CardId, usize>,
}

/// The mutable card universe
///
/// Owns the tag interner (shared with readers via `Arc`), applies
/// mutations under a single-writer discipline, and publishes immutable
/// snapshots. Tag usage counts are maintained incrementally on every
/// mutation so selectivity ordering never requires a full scan.
#[derive(Debug)]
pub struct CardUniverse {
    interner: Arc<TagInterner>,
    writer: Mutex<WriterState>,
    current: RwLock<Arc<UniverseSnapshot>>,
    stats: UniverseStats,
}

impl Default for CardUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl CardUniverse {
    /// Create an empty universe at generation zero
    pub fn new() -> Self {
        let interner = Arc::new(TagInterner::new());
        Self {
            current: RwLock::new(Arc::new(UniverseSnapshot::empty(Arc::clone(&interner)))),
            interner,
            writer: Mutex::new(WriterState::default()),
            stats: UniverseStats::default(),
        }
    }

    /// The shared tag interner
    pub fn interner(&self) -> &Arc<TagInterner> {
        &self.interner
    }

    /// The current snapshot
    ///
    /// Cheap: clones an `Arc`. The snapshot stays consistent for as long
    /// as the caller holds it, regardless of concurrent mutations.
    pub fn snapshot(&self) -> Arc<UniverseSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// The current generation
    pub fn generation(&self) -> Generation {
        self.current.read().generation()
    }

    /// Mutation statistics
    pub fn stats(&self) -> UniverseStatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolve a card ID back to its external identifier
    pub fn resolve_card(&self, id: CardId) -> Option<String> {
        self.writer.lock().registry.resolve(id).map(String::from)
    }

    /// Look up the ID for an external identifier, if the card was ever seen
    pub fn card_id(&self, external_id: &str) -> Option<CardId> {
        self.writer.lock().registry.get(external_id)
    }

    /// Create or replace a card
    ///
    /// The card's tag set is replaced wholesale; usage counts are adjusted
    /// by the difference. Publishes a new snapshot with a bumped
    /// generation.
    pub fn upsert_card(&self, external_id: &str, tags: &[&str]) -> CardId {
        let mut writer = self.writer.lock();
        let id = self.apply_upsert(&mut writer, external_id, tags);
        self.publish(&writer);
        self.stats.mutations.fetch_add(1, Ordering::Relaxed);
        id
    }

    /// Remove a card; returns whether it was present
    ///
    /// The card's ID stays reserved in the registry so a re-add keeps it.
    pub fn remove_card(&self, external_id: &str) -> bool {
        let mut writer = self.writer.lock();
        let removed = self.apply_remove(&mut writer, external_id);
        if removed {
            self.publish(&writer);
            self.stats.mutations.fetch_add(1, Ordering::Relaxed);
            self.stats.cards_removed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Apply a batch of upserts as one mutation (one generation bump)
    pub fn extend<'a, I>(&self, cards: I)
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let mut writer = self.writer.lock();
        for (external_id, tags) in cards {
            self.apply_upsert(&mut writer, external_id, tags);
        }
        self.publish(&writer);
        self.stats.mutations.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // Internal Methods
    // ========================================================================

    fn apply_upsert(&self, writer: &mut WriterState, external_id: &str, tags: &[&str]) -> CardId {
        let id = writer.registry.get_or_create(external_id);
        let new_tags: TagSet = tags
            .iter()
            .map(|name| self.interner.get_or_create_id(name))
            .collect();

        match writer.positions.get(&id).copied() {
            Some(pos) => {
                let old_tags = std::mem::replace(&mut writer.live[pos].1, new_tags.clone());
                self.adjust_usage(&old_tags, &new_tags);
            }
            None => {
                for &tag in new_tags.iter() {
                    self.interner.increment_usage(tag);
                }
                writer.positions.insert(id, writer.live.len());
                writer.live.push((id, new_tags));
                self.stats.cards_created.fetch_add(1, Ordering::Relaxed);
            }
        }
        id
    }

    fn apply_remove(&self, writer: &mut WriterState, external_id: &str) -> bool {
        let Some(id) = writer.registry.get(external_id) else {
            return false;
        };
        let Some(pos) = writer.positions.remove(&id) else {
            return false;
        };

        let (_, old_tags) = writer.live.remove(pos);
        for &tag in old_tags.iter() {
            self.interner.decrement_usage(tag);
        }
        // Positions after the removed card shift down by one
        for (_, p) in writer.positions.iter_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        true
    }

    fn adjust_usage(&self, old: &TagSet, new: &TagSet) {
        for &tag in old.iter() {
            if !new.contains(tag) {
                self.interner.decrement_usage(tag);
            }
        }
        for &tag in new.iter() {
            if !old.contains(tag) {
                self.interner.increment_usage(tag);
            }
        }
    }

    /// Build and atomically publish the next snapshot
    ///
    /// The generation bump is the final step of every mutation; readers
    /// either see the old snapshot or the new one, never a mix.
    fn publish(&self, writer: &WriterState) {
        let next_gen = self.current.read().generation().next();

        let cards: Vec<Card> = writer
            .live
            .iter()
            .map(|(id, tags)| Card::new(*id, tags.clone()))
            .collect();
        let dense_by_card = cards
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, DenseId(i as u32)))
            .collect();

        let snapshot = Arc::new(UniverseSnapshot {
            generation: next_gen,
            cards,
            dense_by_card,
            interner: Arc::clone(&self.interner),
        });

        trace!(generation = next_gen.0, cards = snapshot.len(), "published universe snapshot");
        *self.current.write() = snapshot;
    }
}
