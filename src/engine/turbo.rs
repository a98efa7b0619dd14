//! Turbo tier: bitmap execution for large universes
//!
//! The three phases become word-wide bitwise operations against the
//! per-generation [`BitmapIndex`]: intersection is an AND chain anchored
//! at the smallest bitmap, union is an OR folded then ANDed against the
//! Phase-1 result, exclusion is an AND-NOT. Matching dense IDs are mapped
//! back to card IDs at the end, preserving dense order.

use crate::engine::ResolvedFilter;
use crate::index::{BitmapIndex, CardBitmap};
use crate::types::CardId;
use crate::universe::UniverseSnapshot;

/// Run the filter phases over the bitmap index
pub(crate) fn scan_bitmaps(
    snapshot: &UniverseSnapshot,
    filter: &ResolvedFilter,
    index: &BitmapIndex,
) -> Vec<CardId> {
    if filter.unsatisfiable {
        return Vec::new();
    }

    // Phase 1: AND chain, smallest bitmap first
    let restricted = match intersect(filter, index) {
        Some(bitmap) => bitmap,
        None => return Vec::new(),
    };

    // Phase 2: OR the union bitmaps, AND against the restricted set
    let selected = if filter.union_required {
        let any = filter
            .union
            .iter()
            .filter_map(|&tag| index.bitmap(tag))
            .fold(CardBitmap::new(), |acc, b| acc.or(b));
        restricted.and(&any)
    } else {
        restricted
    };

    // Phase 3: AND-NOT the excluded bitmaps, always last
    let result = if filter.exclusion.is_empty() {
        selected
    } else {
        let excluded = filter
            .exclusion
            .iter()
            .filter_map(|&tag| index.bitmap(tag))
            .fold(CardBitmap::new(), |acc, b| acc.or(b));
        selected.and_not(&excluded)
    };

    result
        .iter()
        .filter_map(|dense| snapshot.card_at(dense))
        .collect()
}

/// Phase 1 as a bitmap AND chain
///
/// Bitmaps are taken in ascending cardinality so the smallest anchors the
/// chain; the chain short-circuits as soon as it goes empty. `None` means
/// the restriction is unsatisfiable in this generation (a required tag
/// has no bitmap at all).
fn intersect(filter: &ResolvedFilter, index: &BitmapIndex) -> Option<CardBitmap> {
    if filter.intersection.is_empty() {
        return Some(index.all_cards().clone());
    }

    let mut bitmaps = Vec::with_capacity(filter.intersection.len());
    for &tag in &filter.intersection {
        // A required tag nothing carries in this generation: empty result
        bitmaps.push(index.bitmap(tag)?);
    }
    bitmaps.sort_by_key(|b| b.cardinality());

    let mut acc = bitmaps[0].clone();
    for bitmap in &bitmaps[1..] {
        acc = acc.and(bitmap);
        if acc.is_empty() {
            return None;
        }
    }
    Some(acc)
}
