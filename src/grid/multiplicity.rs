//! Multiplicity tracking: which cells each card landed in
//!
//! A card whose tags satisfy several coordinate combinations appears in
//! every matching cell — it is never deduplicated away. The multiplicity
//! map records, per card, the ordered list of coordinates it appears at,
//! so a renderer can mark "this card is shown in 3 places".

use std::collections::HashMap;

use crate::grid::CellCoord;
use crate::types::CardId;

/// Map from card to every cell coordinate it appears at
///
/// Built alongside the grid and shares its lifetime. For any grid,
/// the total memberships here equal the summed cell sizes exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiplicityMap {
    map: HashMap<CardId, Vec<CellCoord>>,
}

impl MultiplicityMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a card appears at a coordinate
    pub(crate) fn record(&mut self, card: CardId, coord: CellCoord) {
        self.map.entry(card).or_default().push(coord);
    }

    /// Coordinates a card appears at; empty if it matched no cell
    pub fn coords(&self, card: CardId) -> &[CellCoord] {
        self.map.get(&card).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of cells a card appears in
    pub fn multiplicity(&self, card: CardId) -> usize {
        self.coords(card).len()
    }

    /// Cards that appear in at least one cell
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no card matched any cell
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over (card, coordinates) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&CardId, &Vec<CellCoord>)> {
        self.map.iter()
    }

    /// Total cell memberships across all cards
    ///
    /// Equals the sum of cell sizes in the grid this map was built with.
    pub fn total_memberships(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}
