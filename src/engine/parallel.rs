//! Parallel tier: chunked fan-out over worker threads
//!
//! The universe is split into contiguous chunks, each chunk runs the same
//! three-phase scan as the regular tier, and the per-chunk results are
//! concatenated in chunk order. A card's match is independent of every
//! other card, so no cross-chunk state exists and the output is identical
//! to the regular tier for any partitioning.

use rayon::prelude::*;

use crate::engine::{regular, ResolvedFilter};
use crate::types::CardId;
use crate::universe::Card;

/// Run the filter phases chunk-parallel
///
/// `workers` bounds the chunk count; rayon's pool bounds the actual
/// thread count at the cores available. Output order matches the
/// sequential scan because chunks are concatenated in order.
pub(crate) fn scan_chunked(cards: &[Card], filter: &ResolvedFilter, workers: usize) -> Vec<CardId> {
    if filter.unsatisfiable || cards.is_empty() {
        return Vec::new();
    }

    let chunk_size = cards.len().div_ceil(workers.max(1)).max(1);

    cards
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| regular::scan(chunk, filter))
        .collect()
}
