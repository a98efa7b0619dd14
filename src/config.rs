//! Configuration for tier selection, grid limits, and caching
//!
//! All knobs have sensible defaults and builder-style setters. The struct
//! is serde-compatible so a host application can load it from TOML
//! alongside its own configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration
///
/// Tier thresholds select the execution strategy by universe size; they
/// are a performance knob only and never change results. The defaults
/// mirror the production envelope: direct scans up to 50k cards, chunked
/// parallel scans up to 100k, bitmap execution above that.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Largest universe handled by the single-threaded tier
    #[serde(default = "default_regular_max")]
    pub regular_max: usize,

    /// Largest universe handled by the chunked parallel tier
    #[serde(default = "default_parallel_max")]
    pub parallel_max: usize,

    /// Worker threads for the parallel tier (default: available cores)
    #[serde(default = "default_workers")]
    pub worker_count: usize,

    /// Safety ceiling on grid cell count (product of dimension sizes)
    #[serde(default = "default_max_grid_cells")]
    pub max_grid_cells: usize,

    /// Maximum entries held by the operation cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Enable the operation cache
    #[serde(default = "default_true")]
    pub enable_cache: bool,
}

fn default_regular_max() -> usize {
    50_000
}

fn default_parallel_max() -> usize {
    100_000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_max_grid_cells() -> usize {
    10_000
}

fn default_cache_capacity() -> usize {
    200
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            regular_max: default_regular_max(),
            parallel_max: default_parallel_max(),
            worker_count: default_workers(),
            max_grid_cells: default_max_grid_cells(),
            cache_capacity: default_cache_capacity(),
            enable_cache: default_true(),
        }
    }
}

impl EngineConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tier thresholds
    pub fn with_tier_thresholds(mut self, regular_max: usize, parallel_max: usize) -> Self {
        self.regular_max = regular_max;
        self.parallel_max = parallel_max;
        self
    }

    /// Set the parallel worker count (clamped to at least 1)
    pub fn with_workers(mut self, n: usize) -> Self {
        self.worker_count = n.max(1);
        self
    }

    /// Set the grid cell ceiling
    pub fn with_max_grid_cells(mut self, cells: usize) -> Self {
        self.max_grid_cells = cells;
        self
    }

    /// Set the cache capacity
    pub fn with_cache_capacity(mut self, entries: usize) -> Self {
        self.cache_capacity = entries;
        self
    }

    /// Disable the operation cache
    pub fn without_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regular_max > self.parallel_max {
            return Err(ConfigError::InvalidThresholds {
                regular_max: self.regular_max,
                parallel_max: self.parallel_max,
            });
        }
        if self.max_grid_cells == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_grid_cells",
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "worker_count",
            });
        }
        Ok(())
    }
}
