//! Set operations engine: three-phase filtering over the card universe
//!
//! The engine computes the filtered card set for a [`ZoneConfig`] against
//! a universe snapshot:
//!
//! 1. **Intersection restriction** — every intersection tag must be
//!    present; tags applied rarest-first with early termination.
//! 2. **Union selection** — at least one union tag must be present,
//!    evaluated only within the Phase-1 result.
//! 3. **Exclusion** — cards bearing any exclusion tag are dropped, always
//!    evaluated last.
//!
//! Three execution tiers implement the same contract and are selected by
//! universe size; tier choice never changes the result, only the
//! schedule. Unknown tag names contribute empty matches per the phase
//! semantics and are never an error.
//!
//! The engine is a pure function of (snapshot, configuration): no side
//! effects, deterministic output, safe to retry — which also means a
//! failed computation is never retried internally, since the same input
//! would produce the same outcome.

mod parallel;
mod regular;
mod turbo;
mod zones;

pub use zones::{ZoneConfig, ZoneRole};

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::{BitmapIndexCache, TagInterner};
use crate::types::{CardId, Generation, TagId};
use crate::universe::UniverseSnapshot;

// ============================================================================
// Execution Tiers
// ============================================================================

/// Execution strategy, selected by universe size
///
/// All tiers produce identical output for identical input; the tier is a
/// performance decision, never an observable behavior change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Direct single-threaded scan
    Regular,
    /// Chunked scan across worker threads
    Parallel,
    /// Bitmap index execution
    Turbo,
}

impl Tier {
    /// Pick the tier for a universe of `len` cards
    pub fn select(len: usize, config: &EngineConfig) -> Tier {
        if len <= config.regular_max {
            Tier::Regular
        } else if len <= config.parallel_max {
            Tier::Parallel
        } else {
            Tier::Turbo
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Regular => write!(f, "regular"),
            Tier::Parallel => write!(f, "parallel"),
            Tier::Turbo => write!(f, "turbo"),
        }
    }
}

// ============================================================================
// Resolved Filter
// ============================================================================

/// Filter zones resolved from names to interned IDs
///
/// Unknown names are resolved per phase semantics at this stage: an
/// unknown intersection tag makes the whole restriction unsatisfiable,
/// unknown union tags keep the requirement but cannot satisfy it, and
/// unknown exclusion tags exclude nothing.
#[derive(Debug, Default)]
pub(crate) struct ResolvedFilter {
    /// Intersection tags, rarest first
    pub intersection: Vec<TagId>,

    /// An intersection tag is unknown: no card can satisfy the restriction
    pub unsatisfiable: bool,

    /// Union tags that resolved
    pub union: Vec<TagId>,

    /// The union zone held at least one tag (known or not)
    pub union_required: bool,

    /// Exclusion tags that resolved
    pub exclusion: Vec<TagId>,
}

/// Resolve a zone configuration against the interner
///
/// Selectivity ordering happens here: current usage counts sort the
/// intersection tags rarest-first. Counts only order the work, they never
/// decide membership, so a count that is momentarily out of step with the
/// snapshot cannot change results.
pub(crate) fn resolve_filter(config: &ZoneConfig, interner: &TagInterner) -> ResolvedFilter {
    let mut unsatisfiable = false;
    let mut intersection = Vec::with_capacity(config.intersection.len());
    for name in &config.intersection {
        match interner.id(name) {
            Some(id) => intersection.push(id),
            None => unsatisfiable = true,
        }
    }
    let intersection = interner.selectivity_order(&intersection);

    let union: Vec<TagId> = config
        .union
        .iter()
        .filter_map(|name| interner.id(name))
        .collect();

    let exclusion: Vec<TagId> = config
        .exclusion
        .iter()
        .filter_map(|name| interner.id(name))
        .collect();

    ResolvedFilter {
        intersection,
        unsatisfiable,
        union,
        union_required: !config.union.is_empty(),
        exclusion,
    }
}

// ============================================================================
// Filter Output
// ============================================================================

/// The filtered card set plus execution metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    /// Matching cards, in dense (universe) order
    pub cards: Vec<CardId>,

    /// The tier that executed the request
    pub tier: Tier,

    /// Generation of the snapshot the result was computed from
    pub generation: Generation,
}

impl FilterOutput {
    /// Number of matching cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if nothing matched
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ============================================================================
// Engine Statistics
// ============================================================================

/// Per-tier execution counters
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Requests served by the regular tier
    pub regular_runs: AtomicU64,

    /// Requests served by the parallel tier
    pub parallel_runs: AtomicU64,

    /// Requests served by the turbo tier
    pub turbo_runs: AtomicU64,
}

/// Snapshot of engine statistics (non-atomic copy)
#[derive(Debug, Clone)]
pub struct EngineStatsSnapshot {
    /// Requests served by the regular tier
    pub regular_runs: u64,
    /// Requests served by the parallel tier
    pub parallel_runs: u64,
    /// Requests served by the turbo tier
    pub turbo_runs: u64,
}

impl EngineStats {
    fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            regular_runs: self.regular_runs.load(Ordering::Relaxed),
            parallel_runs: self.parallel_runs.load(Ordering::Relaxed),
            turbo_runs: self.turbo_runs.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Set Operations Engine
// ============================================================================

/// The set operations engine
///
/// Holds the configuration, the lazily-built bitmap index for the turbo
/// tier, and execution statistics. Cheap to share behind an `Arc`;
/// `filter` takes `&self`.
#[derive(Debug)]
pub struct SetOpsEngine {
    config: EngineConfig,
    bitmap_cache: BitmapIndexCache,
    stats: EngineStats,
}

impl SetOpsEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            bitmap_cache: BitmapIndexCache::new(),
            stats: EngineStats::default(),
        }
    }

    /// Create an engine with default configuration
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execution statistics
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Compute the filtered card set for a zone configuration
    ///
    /// Validates the configuration, selects a tier by universe size, and
    /// runs the three phases. Pure with respect to the snapshot; the only
    /// internal state touched is the bitmap index cache and counters.
    pub fn filter(&self, snapshot: &UniverseSnapshot, config: &ZoneConfig) -> Result<FilterOutput> {
        let tier = Tier::select(snapshot.len(), &self.config);
        self.filter_with_tier(snapshot, config, tier)
    }

    /// Compute the filtered card set on an explicitly chosen tier
    ///
    /// Tier choice never affects results; this entry point exists so
    /// equivalence can be tested and benchmarked directly.
    pub fn filter_with_tier(
        &self,
        snapshot: &UniverseSnapshot,
        config: &ZoneConfig,
        tier: Tier,
    ) -> Result<FilterOutput> {
        config.validate()?;

        let filter = resolve_filter(config, snapshot.interner());

        debug!(
            tier = %tier,
            universe = snapshot.len(),
            generation = snapshot.generation().0,
            "executing filter"
        );

        let cards = match tier {
            Tier::Regular => {
                self.stats.regular_runs.fetch_add(1, Ordering::Relaxed);
                regular::scan(snapshot.cards(), &filter)
            }
            Tier::Parallel => {
                self.stats.parallel_runs.fetch_add(1, Ordering::Relaxed);
                parallel::scan_chunked(snapshot.cards(), &filter, self.config.worker_count)
            }
            Tier::Turbo => {
                self.stats.turbo_runs.fetch_add(1, Ordering::Relaxed);
                let index = self.bitmap_cache.get_or_build(snapshot);
                turbo::scan_bitmaps(snapshot, &filter, &index)
            }
        };

        Ok(FilterOutput {
            cards,
            tier,
            generation: snapshot.generation(),
        })
    }
}
