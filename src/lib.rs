//! cardgrid - Set operations and dimensional partitioning for tagged cards
//!
//! This library is the computational core of a spatial tag-manipulation
//! system: given a universe of tagged cards and a zone configuration
//! (which tags filter, which tags partition), it produces:
//! - the filtered card set (intersection / union / exclusion semantics)
//! - an N-dimensional grid of card subsets with multiplicity tracking
//!
//! Three behavior-equivalent execution tiers (scan, chunked parallel,
//! bitmap index) are selected by universe size, and results are memoized
//! in a generation-keyed cache that is invalidated by data change, never
//! by the clock.
//!
//! It is a library-level boundary, not a service: no I/O, no wire format,
//! no persistence — those belong to the surrounding system.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod grid;
pub mod index;
pub mod types;
pub mod universe;

/// Configuration for tier thresholds, grid limits, and caching
pub mod config;

// Re-export main types
pub use cache::CachedEngine;
pub use config::EngineConfig;
pub use engine::{FilterOutput, SetOpsEngine, Tier, ZoneConfig, ZoneRole};
pub use error::{Error, Result};
pub use grid::{CellCoord, Grid, GridOutput, GridPartitioner, MultiplicityMap};
pub use types::{CardId, Generation, TagId};
pub use universe::{Card, CardUniverse, TagSet, UniverseSnapshot};
