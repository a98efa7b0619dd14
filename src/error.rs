//! Error types for the engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Set operations error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Grid partitioning error
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Set operations errors
///
/// Unknown tags are deliberately absent here: a tag name with no interner
/// entry contributes an empty match per phase semantics, because a tag can
/// legitimately be removed between render and user action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A tag was assigned to more than one filter zone in one request
    ///
    /// The engine does not guess precedence; the caller must resolve the
    /// ambiguity and retry.
    #[error("Tag '{tag}' appears in more than one of intersection/union/exclusion")]
    AmbiguousZoneAssignment {
        /// The tag name assigned to multiple zones
        tag: String,
    },
}

/// Grid partitioning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The configured cell ceiling would be exceeded
    ///
    /// The partitioner never silently truncates; the caller decides how to
    /// narrow the dimensions.
    #[error("Grid would have {cells} cells (limit: {limit})")]
    DimensionOverflow {
        /// Number of cells the requested dimensions would produce
        cells: usize,
        /// Configured safety ceiling
        limit: usize,
    },
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Tier thresholds are inverted or degenerate
    #[error("Invalid tier thresholds: regular_max {regular_max} must be <= parallel_max {parallel_max}")]
    InvalidThresholds {
        /// Upper bound of the regular tier
        regular_max: usize,
        /// Upper bound of the parallel tier
        parallel_max: usize,
    },

    /// A limit that must be nonzero was zero
    #[error("{field} must be nonzero")]
    ZeroLimit {
        /// Field name being validated
        field: &'static str,
    },
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
