//! Operation cache: generation-keyed memoization of engine output
//!
//! Results are cached under `(generation, canonical configuration)`.
//! Canonicalization sorts every tag set, so two requests that differ only
//! in tag order share one entry. Invalidation is purely generational:
//! a mutation bumps the universe's generation, old keys simply stop being
//! looked up, and stale entries age out through LRU eviction or an
//! explicit [`clear`](OperationCache::clear). There is no TTL and no
//! wall clock anywhere in the cache — whether an entry is valid depends
//! on whether the universe changed, never on how much time passed.
//!
//! The cache is an optimization layer only: every code path that could
//! skip it (cache disabled, entry missing) falls through to direct
//! computation, and no cache condition is ever surfaced as an error.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::EngineConfig;
use crate::engine::{FilterOutput, SetOpsEngine, ZoneConfig};
use crate::error::Result;
use crate::grid::{GridOutput, GridPartitioner};
use crate::types::Generation;
use crate::universe::UniverseSnapshot;

// ============================================================================
// Cache Key
// ============================================================================

/// Cache key: generation plus canonical configuration hash
///
/// Embedding the generation makes invalidation implicit — an entry from
/// an old generation can never match a current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    generation: Generation,
    config_hash: u64,
}

impl CacheKey {
    /// Build the key for a request
    pub fn new(generation: Generation, config: &ZoneConfig) -> Self {
        Self {
            generation,
            config_hash: config.canonical_hash(),
        }
    }

    /// The generation this key belongs to
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Cache hit/miss counters
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: AtomicU64,

    /// Lookups that fell through to computation
    pub misses: AtomicU64,

    /// Entries written
    pub insertions: AtomicU64,

    /// Entries displaced by capacity
    pub evictions: AtomicU64,
}

/// Snapshot of cache statistics (non-atomic copy)
#[derive(Debug, Clone)]
pub struct CacheStatsSnapshot {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that fell through to computation
    pub misses: u64,
    /// Entries written
    pub insertions: u64,
    /// Entries displaced by capacity
    pub evictions: u64,
}

impl CacheStats {
    fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Operation Cache
// ============================================================================

/// A capacity-bounded LRU cache over one result type
///
/// Values are shared as `Arc` so a hit never copies the result. Safe for
/// concurrent use; the LRU order is guarded by a mutex.
pub struct OperationCache<V> {
    inner: Mutex<LruCache<CacheKey, Arc<V>>>,
    stats: CacheStats,
}

impl<V> std::fmt::Debug for OperationCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationCache")
            .field("entries", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<V> OperationCache<V> {
    /// Create a cache holding at most `capacity` entries
    ///
    /// A zero capacity is clamped to one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            stats: CacheStats::default(),
        }
    }

    /// Look up an entry, updating LRU order on hit
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let hit = self.inner.lock().get(key).cloned();
        match &hit {
            Some(_) => self.stats.hits.fetch_add(1, Ordering::Relaxed),
            None => self.stats.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Insert an entry, evicting the least recently used if full
    pub fn insert(&self, key: CacheKey, value: Arc<V>) {
        let evicted = self.inner.lock().push(key, value);
        self.stats.insertions.fetch_add(1, Ordering::Relaxed);
        if let Some((old_key, _)) = evicted {
            if old_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(generation = old_key.generation().0, "evicted cache entry");
            }
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss statistics
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

// ============================================================================
// Cached Engine
// ============================================================================

/// Engine and partitioner behind the operation cache
///
/// The memoizing front door: identical requests within one generation are
/// served from cache, and any request that cannot be served from cache is
/// computed directly — the cache can only ever make a request cheaper,
/// never fail it.
#[derive(Debug)]
pub struct CachedEngine {
    engine: SetOpsEngine,
    partitioner: GridPartitioner,
    filter_cache: OperationCache<FilterOutput>,
    grid_cache: OperationCache<GridOutput>,
    enabled: bool,
}

impl CachedEngine {
    /// Create a cached engine from one configuration
    pub fn new(config: EngineConfig) -> Self {
        let capacity = config.cache_capacity;
        let enabled = config.enable_cache;
        Self {
            engine: SetOpsEngine::new(config.clone()),
            partitioner: GridPartitioner::new(config),
            filter_cache: OperationCache::new(capacity),
            grid_cache: OperationCache::new(capacity),
            enabled,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// The underlying set operations engine
    pub fn engine(&self) -> &SetOpsEngine {
        &self.engine
    }

    /// Filtered card set for a configuration, memoized per generation
    pub fn filter(
        &self,
        snapshot: &UniverseSnapshot,
        config: &ZoneConfig,
    ) -> Result<Arc<FilterOutput>> {
        if !self.enabled {
            return Ok(Arc::new(self.engine.filter(snapshot, config)?));
        }

        let key = CacheKey::new(snapshot.generation(), config);
        if let Some(cached) = self.filter_cache.get(&key) {
            return Ok(cached);
        }

        let result = Arc::new(self.engine.filter(snapshot, config)?);
        self.filter_cache.insert(key, Arc::clone(&result));
        Ok(result)
    }

    /// Grid and multiplicity map for a configuration, memoized per
    /// generation
    ///
    /// The filter step reuses the filter cache, so a grid request after a
    /// plain filter request with the same zones recomputes nothing.
    pub fn grid(
        &self,
        snapshot: &UniverseSnapshot,
        config: &ZoneConfig,
    ) -> Result<Arc<GridOutput>> {
        if !self.enabled {
            let filtered = self.engine.filter(snapshot, config)?;
            return Ok(Arc::new(self.partitioner.partition(
                snapshot,
                &filtered.cards,
                config,
            )?));
        }

        let key = CacheKey::new(snapshot.generation(), config);
        if let Some(cached) = self.grid_cache.get(&key) {
            return Ok(cached);
        }

        let filtered = self.filter(snapshot, config)?;
        let result = Arc::new(
            self.partitioner
                .partition(snapshot, &filtered.cards, config)?,
        );
        self.grid_cache.insert(key, Arc::clone(&result));
        Ok(result)
    }

    /// Drop every cached entry (both filter and grid results)
    pub fn clear_cache(&self) {
        self.filter_cache.clear();
        self.grid_cache.clear();
    }

    /// Filter-cache statistics
    pub fn filter_cache_stats(&self) -> CacheStatsSnapshot {
        self.filter_cache.stats()
    }

    /// Grid-cache statistics
    pub fn grid_cache_stats(&self) -> CacheStatsSnapshot {
        self.grid_cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::CardUniverse;

    fn universe() -> CardUniverse {
        let u = CardUniverse::new();
        let cards: Vec<(&str, &[&str])> = vec![
            ("A", &["x", "y"] as &[&str]),
            ("B", &["x"]),
            ("C", &["y", "z"]),
        ];
        u.extend(cards);
        u
    }

    #[test]
    fn test_key_embeds_generation() {
        let config = ZoneConfig::new().with_intersection(["x"]);
        let k1 = CacheKey::new(Generation(1), &config);
        let k2 = CacheKey::new(Generation(2), &config);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_key_order_insensitive() {
        let a = ZoneConfig::new().with_intersection(["x", "y"]);
        let b = ZoneConfig::new().with_intersection(["y", "x"]);
        assert_eq!(
            CacheKey::new(Generation(1), &a),
            CacheKey::new(Generation(1), &b)
        );
    }

    #[test]
    fn test_second_identical_request_hits() {
        let u = universe();
        let cached = CachedEngine::with_defaults();
        let snapshot = u.snapshot();
        let config = ZoneConfig::new().with_intersection(["x"]);

        let first = cached.filter(&snapshot, &config).unwrap();
        let second = cached.filter(&snapshot, &config).unwrap();

        // Same Arc: served from cache, not recomputed
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cached.filter_cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_mutation_forces_recompute() {
        let u = universe();
        let cached = CachedEngine::with_defaults();
        let config = ZoneConfig::new().with_intersection(["x"]);

        let before = cached.filter(&u.snapshot(), &config).unwrap();
        assert_eq!(before.len(), 2);

        // Mutation bumps the generation: the old entry is unreachable
        u.upsert_card("D", &["x"]);
        let after = cached.filter(&u.snapshot(), &config).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.len(), 3);
    }

    #[test]
    fn test_lru_eviction() {
        let cache: OperationCache<u32> = OperationCache::new(2);
        let configs: Vec<ZoneConfig> = ["a", "b", "c"]
            .iter()
            .map(|t| ZoneConfig::new().with_intersection([*t]))
            .collect();
        let keys: Vec<CacheKey> = configs
            .iter()
            .map(|c| CacheKey::new(Generation(1), c))
            .collect();

        cache.insert(keys[0], Arc::new(0));
        cache.insert(keys[1], Arc::new(1));
        cache.insert(keys[2], Arc::new(2));

        // Oldest entry displaced
        assert!(cache.get(&keys[0]).is_none());
        assert!(cache.get(&keys[1]).is_some());
        assert!(cache.get(&keys[2]).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_clear() {
        let u = universe();
        let cached = CachedEngine::with_defaults();
        let config = ZoneConfig::new();

        cached.filter(&u.snapshot(), &config).unwrap();
        cached.grid(&u.snapshot(), &config).unwrap();
        cached.clear_cache();

        assert!(cached.filter_cache.is_empty());
        assert!(cached.grid_cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_computes_directly() {
        let u = universe();
        let cached = CachedEngine::new(EngineConfig::default().without_cache());
        let snapshot = u.snapshot();
        let config = ZoneConfig::new().with_intersection(["x"]);

        let first = cached.filter(&snapshot, &config).unwrap();
        let second = cached.filter(&snapshot, &config).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.cards, second.cards);
        assert_eq!(cached.filter_cache_stats().insertions, 0);
    }

    #[test]
    fn test_grid_reuses_filter_cache() {
        let u = universe();
        let cached = CachedEngine::with_defaults();
        let snapshot = u.snapshot();
        let config = ZoneConfig::new()
            .with_intersection(["x"])
            .with_columns(["y"]);

        cached.filter(&snapshot, &config).unwrap();
        cached.grid(&snapshot, &config).unwrap();

        // Grid's filter step hit the filter cache instead of recomputing
        let stats = cached.filter_cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let u = universe();
        let cached = CachedEngine::with_defaults();
        let snapshot = u.snapshot();
        let config = ZoneConfig::new()
            .with_intersection(["x"])
            .with_union(["x"]);

        assert!(cached.filter(&snapshot, &config).is_err());
        assert!(cached.filter(&snapshot, &config).is_err());
        assert!(cached.filter_cache.is_empty());
    }
}
