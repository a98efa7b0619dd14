//! Zone configuration: the user's current tag arrangement
//!
//! A tag means different things depending on where it sits: dropped in the
//! intersection zone it is a mandatory filter, in a row zone it is a grid
//! axis. That placement semantic is a [`ZoneRole`] attached to each
//! assignment and dispatched by a single `match` — the same tag name may
//! carry different roles in different requests.
//!
//! A `ZoneConfig` is built fresh per request and immutable once handed to
//! the engine.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The role a tag plays in one request, determined by spatial placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneRole {
    /// Card must have this tag (all intersection tags required)
    Intersection,
    /// Card must have at least one of the union tags
    Union,
    /// Card must not have this tag
    Exclusion,
    /// Tag is a row coordinate of the grid
    Row,
    /// Tag is a column coordinate of the grid
    Column,
    /// Tag is a coordinate of the given extra dimension
    Slice(usize),
}

/// The tags in play for one request
///
/// Filter zones (intersection/union/exclusion) determine the filtered
/// set; row/column/slice zones determine the grid axes. A tag may appear
/// in at most one filter zone, but may freely appear on several grid axes
/// or in both a filter zone and a grid axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Tags that must ALL be present
    pub intersection: BTreeSet<String>,

    /// Tags of which AT LEAST ONE must be present, evaluated within the
    /// intersection-restricted universe
    pub union: BTreeSet<String>,

    /// Tags whose presence disqualifies a card
    pub exclusion: BTreeSet<String>,

    /// Row-axis tags, in display order
    pub rows: Vec<String>,

    /// Column-axis tags, in display order
    pub columns: Vec<String>,

    /// Extra dimensions, one tag list each, in dimension order
    pub slices: Vec<Vec<String>>,
}

impl ZoneConfig {
    /// Create an empty configuration (matches the full universe, one cell)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add intersection tags
    pub fn with_intersection<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intersection.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add union tags
    pub fn with_union<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.union.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add exclusion tags
    pub fn with_exclusion<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusion.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the row-axis tags
    pub fn with_rows<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the column-axis tags
    pub fn with_columns<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Append an extra slice dimension
    pub fn with_slice<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slices.push(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Assign a single tag to a zone by role
    ///
    /// The drag-and-drop form of construction: one tag lands in one zone.
    pub fn assign(mut self, tag: impl Into<String>, role: ZoneRole) -> Self {
        let tag = tag.into();
        match role {
            ZoneRole::Intersection => {
                self.intersection.insert(tag);
            }
            ZoneRole::Union => {
                self.union.insert(tag);
            }
            ZoneRole::Exclusion => {
                self.exclusion.insert(tag);
            }
            ZoneRole::Row => self.rows.push(tag),
            ZoneRole::Column => self.columns.push(tag),
            ZoneRole::Slice(dim) => {
                if self.slices.len() <= dim {
                    self.slices.resize(dim + 1, Vec::new());
                }
                self.slices[dim].push(tag);
            }
        }
        self
    }

    /// Check that no tag sits in more than one filter zone
    ///
    /// Such a request is ambiguous (is the tag required or forbidden?) and
    /// is rejected rather than guessed at. Grid axes are exempt: a tag on
    /// two axes, or in a filter zone and on an axis, is a legal compound
    /// constraint.
    pub fn validate(&self) -> Result<(), EngineError> {
        for tag in &self.intersection {
            if self.union.contains(tag) || self.exclusion.contains(tag) {
                return Err(EngineError::AmbiguousZoneAssignment { tag: tag.clone() });
            }
        }
        for tag in &self.union {
            if self.exclusion.contains(tag) {
                return Err(EngineError::AmbiguousZoneAssignment { tag: tag.clone() });
            }
        }
        Ok(())
    }

    /// True if no filter zone holds any tag (result = full universe)
    pub fn is_unfiltered(&self) -> bool {
        self.intersection.is_empty() && self.union.is_empty() && self.exclusion.is_empty()
    }

    /// True if no grid axis holds any tag
    pub fn has_no_axes(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.slices.iter().all(Vec::is_empty)
    }

    /// Hash of the canonical form of this configuration
    ///
    /// Every tag set is visited in sorted order and axis duplicates are
    /// ignored for filtering purposes, so two configurations that differ
    /// only in tag insertion order produce the same hash. Used with the
    /// generation as the cache key.
    pub fn canonical_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();

        // BTreeSets iterate sorted already
        for (label, set) in [
            ("i", &self.intersection),
            ("u", &self.union),
            ("x", &self.exclusion),
        ] {
            label.hash(&mut hasher);
            for tag in set {
                tag.hash(&mut hasher);
            }
        }

        for (label, axis) in [("r", &self.rows), ("c", &self.columns)] {
            label.hash(&mut hasher);
            for tag in sorted(axis) {
                tag.hash(&mut hasher);
            }
        }

        "s".hash(&mut hasher);
        self.slices.len().hash(&mut hasher);
        for slice in &self.slices {
            for tag in sorted(slice) {
                tag.hash(&mut hasher);
            }
            ";".hash(&mut hasher);
        }

        hasher.finish()
    }
}

fn sorted(tags: &[String]) -> Vec<&String> {
    let mut v: Vec<&String> = tags.iter().collect();
    v.sort();
    v
}
