//! Dimensional grid partitioning of a filtered card set
//!
//! The partitioner takes the engine's filtered output plus the row,
//! column, and slice tag lists and produces a grid of card subsets: one
//! cell per coordinate combination, where a cell holds exactly the cards
//! carrying every tag of its coordinate. Dimension count is open-ended —
//! a coordinate is an ordered vector of tag names, not a fixed pair.
//!
//! Cards are visited once each; per card the matching tags of every
//! dimension are collected and their cartesian product gives the card's
//! cells. That keeps the cost at O(|filtered| × dimensions) plus total
//! memberships, instead of rescanning the filtered set per cell.

mod multiplicity;

pub use multiplicity::MultiplicityMap;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::ZoneConfig;
use crate::error::{GridError, Result};
use crate::types::{CardId, TagId};
use crate::universe::UniverseSnapshot;

// ============================================================================
// Cell Coordinates
// ============================================================================

/// A cell's coordinate: one tag name per active dimension
///
/// Dimension order is rows, columns, then slices in declaration order.
/// Axes with no tags contribute no entry (the axis collapses), so a grid
/// with empty axes everywhere has a single cell with an empty coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord(pub Vec<String>);

impl CellCoord {
    /// Build a coordinate from tag names
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "(all)")
        } else {
            write!(f, "({})", self.0.join(", "))
        }
    }
}

// ============================================================================
// Grid
// ============================================================================

/// The partitioned grid: every coordinate combination, empty cells included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Active dimensions, in coordinate order (duplicates within an axis
    /// collapsed)
    dims: Vec<Vec<String>>,

    /// Coordinates in row-major enumeration order
    coords: Vec<CellCoord>,

    /// Cell membership, keyed by coordinate
    cells: HashMap<CellCoord, Vec<CardId>>,
}

impl Grid {
    /// Active dimensions in coordinate order
    pub fn dims(&self) -> &[Vec<String>] {
        &self.dims
    }

    /// Number of cells (product of active dimension sizes)
    pub fn cell_count(&self) -> usize {
        self.coords.len()
    }

    /// Cards at a coordinate; `None` for a coordinate outside the grid
    pub fn cell(&self, coord: &CellCoord) -> Option<&[CardId]> {
        self.cells.get(coord).map(Vec::as_slice)
    }

    /// Convenience lookup by tag names
    pub fn cell_at(&self, tags: &[&str]) -> Option<&[CardId]> {
        self.cell(&CellCoord::new(tags.iter().copied()))
    }

    /// Iterate cells in row-major coordinate order
    pub fn iter(&self) -> impl Iterator<Item = (&CellCoord, &[CardId])> {
        self.coords
            .iter()
            .map(move |c| (c, self.cells[c].as_slice()))
    }

    /// Sum of cell sizes (counts a multi-cell card once per cell)
    pub fn total_memberships(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}

/// Grid plus its multiplicity map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOutput {
    /// The partitioned grid
    pub grid: Grid,

    /// Which cells each card landed in
    pub multiplicity: MultiplicityMap,
}

// ============================================================================
// Grid Partitioner
// ============================================================================

/// Partitions a filtered card set into an N-dimensional grid
#[derive(Debug)]
pub struct GridPartitioner {
    config: EngineConfig,
}

impl GridPartitioner {
    /// Create a partitioner with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create a partitioner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Build the grid and multiplicity map for a filtered set
    ///
    /// `filtered` must come from a filter over the same snapshot; every
    /// cell is a subset of it. A tag shared between two axes constrains
    /// both simultaneously — legal, possibly trivially restrictive. Fails
    /// only when the coordinate product exceeds the configured ceiling.
    pub fn partition(
        &self,
        snapshot: &UniverseSnapshot,
        filtered: &[CardId],
        config: &ZoneConfig,
    ) -> Result<GridOutput> {
        // Active dimensions: empty axes collapse away entirely
        let dims: Vec<Vec<(String, Option<TagId>)>> = axis_lists(config)
            .into_iter()
            .filter(|axis| !axis.is_empty())
            .map(|axis| resolve_axis(snapshot, axis))
            .collect();

        let cell_count = dims
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(d.len()))
            .unwrap_or(usize::MAX);
        if cell_count > self.config.max_grid_cells {
            return Err(GridError::DimensionOverflow {
                cells: cell_count,
                limit: self.config.max_grid_cells,
            }
            .into());
        }

        // Every coordinate combination exists up front; empty cells are
        // part of the result
        let coords = enumerate_coords(&dims);
        let mut cells: HashMap<CellCoord, Vec<CardId>> =
            coords.iter().map(|c| (c.clone(), Vec::new())).collect();
        let mut multiplicity = MultiplicityMap::new();

        for &card_id in filtered {
            let Some(card) = snapshot.card(card_id) else {
                continue;
            };

            // Tags of each dimension this card carries
            let matches: Vec<Vec<&str>> = dims
                .iter()
                .map(|axis| {
                    axis.iter()
                        .filter(|(_, id)| id.is_some_and(|t| card.tags.contains(t)))
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<&str>>()
                })
                .collect();

            if matches.iter().any(Vec::is_empty) {
                continue;
            }

            for coord in enumerate_matches(&matches) {
                if let Some(cell) = cells.get_mut(&coord) {
                    cell.push(card_id);
                }
                multiplicity.record(card_id, coord);
            }
        }

        debug!(
            cells = cell_count,
            dims = dims.len(),
            filtered = filtered.len(),
            memberships = multiplicity.total_memberships(),
            "partitioned grid"
        );

        Ok(GridOutput {
            grid: Grid {
                dims: dims
                    .into_iter()
                    .map(|axis| axis.into_iter().map(|(name, _)| name).collect())
                    .collect(),
                coords,
                cells,
            },
            multiplicity,
        })
    }
}

/// Axes in coordinate order: rows, columns, slices
fn axis_lists(config: &ZoneConfig) -> Vec<&[String]> {
    let mut axes: Vec<&[String]> = vec![&config.rows, &config.columns];
    for slice in &config.slices {
        axes.push(slice);
    }
    axes
}

/// Resolve an axis's tag names, dropping duplicates within the axis
fn resolve_axis(snapshot: &UniverseSnapshot, axis: &[String]) -> Vec<(String, Option<TagId>)> {
    let mut seen = std::collections::HashSet::new();
    axis.iter()
        .filter(|name| seen.insert(name.as_str()))
        .map(|name| (name.clone(), snapshot.interner().id(name)))
        .collect()
}

/// All coordinate combinations, row-major
fn enumerate_coords(dims: &[Vec<(String, Option<TagId>)>]) -> Vec<CellCoord> {
    let mut coords = vec![CellCoord(Vec::new())];
    for axis in dims {
        let mut next = Vec::with_capacity(coords.len() * axis.len());
        for prefix in &coords {
            for (name, _) in axis {
                let mut coord = prefix.0.clone();
                coord.push(name.clone());
                next.push(CellCoord(coord));
            }
        }
        coords = next;
    }
    coords
}

/// Cartesian product of one card's per-dimension matches, row-major
fn enumerate_matches(matches: &[Vec<&str>]) -> Vec<CellCoord> {
    let mut coords = vec![CellCoord(Vec::new())];
    for axis_matches in matches {
        let mut next = Vec::with_capacity(coords.len() * axis_matches.len());
        for prefix in &coords {
            for name in axis_matches {
                let mut coord = prefix.0.clone();
                coord.push((*name).to_string());
                next.push(CellCoord(coord));
            }
        }
        coords = next;
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SetOpsEngine, ZoneConfig};
    use crate::universe::CardUniverse;

    fn five_card_universe() -> CardUniverse {
        let universe = CardUniverse::new();
        let cards: Vec<(&str, &[&str])> = vec![
            ("A", &["x", "y"] as &[&str]),
            ("B", &["x"]),
            ("C", &["y", "z"]),
            ("D", &["z"]),
            ("E", &[]),
        ];
        universe.extend(cards);
        universe
    }

    fn filter_all(universe: &CardUniverse) -> Vec<CardId> {
        let engine = SetOpsEngine::with_defaults();
        engine
            .filter(&universe.snapshot(), &ZoneConfig::new())
            .unwrap()
            .cards
    }

    fn card(universe: &CardUniverse, name: &str) -> CardId {
        universe.card_id(name).unwrap()
    }

    #[test]
    fn test_single_row_two_columns() {
        // rows={x}, cols={y,z}: cell (x,y)={A}, cell (x,z)={}
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_rows(["x"]).with_columns(["y", "z"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 2);
        assert_eq!(
            output.grid.cell_at(&["x", "y"]).unwrap(),
            &[card(&universe, "A")]
        );
        assert!(output.grid.cell_at(&["x", "z"]).unwrap().is_empty());
        assert_eq!(output.multiplicity.multiplicity(card(&universe, "A")), 1);
    }

    #[test]
    fn test_empty_axes_single_cell() {
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &ZoneConfig::new())
            .unwrap();

        assert_eq!(output.grid.cell_count(), 1);
        let cell = output.grid.cell(&CellCoord(Vec::new())).unwrap();
        assert_eq!(cell.len(), 5);
        assert_eq!(output.multiplicity.total_memberships(), 5);
    }

    #[test]
    fn test_empty_row_axis_collapses() {
        // No row tags: one implicit row spanning everything, columns
        // still partition
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_columns(["x", "z"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 2);
        assert_eq!(output.grid.cell_at(&["x"]).unwrap().len(), 2); // A, B
        assert_eq!(output.grid.cell_at(&["z"]).unwrap().len(), 2); // C, D
    }

    #[test]
    fn test_multiplicity_card_in_two_cells() {
        // A has x and y: with columns {x, y} it lands in both cells
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_columns(["x", "y"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        let a = card(&universe, "A");
        assert_eq!(output.multiplicity.multiplicity(a), 2);

        // Conservation: summed cell sizes equal summed coordinate lists
        assert_eq!(
            output.grid.total_memberships(),
            output.multiplicity.total_memberships()
        );
        // A counted once per cell, so memberships exceed distinct cards
        assert!(output.grid.total_memberships() > output.multiplicity.len());
    }

    #[test]
    fn test_three_dimensions() {
        let universe = CardUniverse::new();
        let cards: Vec<(&str, &[&str])> = vec![
            ("A", &["r1", "c1", "s1"] as &[&str]),
            ("B", &["r1", "c1", "s2"]),
            ("C", &["r1", "c2", "s1"]),
        ];
        universe.extend(cards);
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new()
            .with_rows(["r1"])
            .with_columns(["c1", "c2"])
            .with_slice(["s1", "s2"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 4);
        assert_eq!(
            output.grid.cell_at(&["r1", "c1", "s1"]).unwrap(),
            &[card(&universe, "A")]
        );
        assert_eq!(
            output.grid.cell_at(&["r1", "c1", "s2"]).unwrap(),
            &[card(&universe, "B")]
        );
        assert!(output.grid.cell_at(&["r1", "c2", "s2"]).unwrap().is_empty());
    }

    #[test]
    fn test_shared_tag_on_both_axes() {
        // x on rows and columns: cell (x, x) needs x once, trivially both
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_rows(["x"]).with_columns(["x"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 1);
        let cell = output.grid.cell_at(&["x", "x"]).unwrap();
        assert_eq!(cell.len(), 2); // A, B
    }

    #[test]
    fn test_unknown_axis_tag_yields_empty_cells() {
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_rows(["ghost"]).with_columns(["x"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 1);
        assert!(output.grid.cell_at(&["ghost", "x"]).unwrap().is_empty());
        assert!(output.multiplicity.is_empty());
    }

    #[test]
    fn test_dimension_overflow() {
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::new(EngineConfig::default().with_max_grid_cells(3));

        let config = ZoneConfig::new()
            .with_rows(["a", "b"])
            .with_columns(["c", "d"]);
        let err = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Grid(GridError::DimensionOverflow { cells: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_cells_subset_of_filtered() {
        let universe = five_card_universe();
        let engine = SetOpsEngine::with_defaults();
        let snapshot = universe.snapshot();

        // Filter to x-cards only, then partition by y/z columns
        let filter_config = ZoneConfig::new().with_intersection(["x"]);
        let filtered = engine.filter(&snapshot, &filter_config).unwrap().cards;

        let partitioner = GridPartitioner::with_defaults();
        let grid_config = ZoneConfig::new().with_columns(["y", "z"]);
        let output = partitioner
            .partition(&snapshot, &filtered, &grid_config)
            .unwrap();

        for (_, cell) in output.grid.iter() {
            for id in cell {
                assert!(filtered.contains(id));
            }
        }
        // C has y but was filtered out by I={x}: must not appear
        assert_eq!(
            output.grid.cell_at(&["y"]).unwrap(),
            &[card(&universe, "A")]
        );
    }

    #[test]
    fn test_duplicate_axis_tags_collapse() {
        let universe = five_card_universe();
        let filtered = filter_all(&universe);
        let partitioner = GridPartitioner::with_defaults();

        let config = ZoneConfig::new().with_columns(["x", "x", "y"]);
        let output = partitioner
            .partition(&universe.snapshot(), &filtered, &config)
            .unwrap();

        assert_eq!(output.grid.cell_count(), 2);
        assert_eq!(output.grid.dims()[0], vec!["x", "y"]);
    }
}
