//! Regular tier: single-threaded three-phase scan
//!
//! The reference execution strategy. The other tiers must produce
//! byte-identical output; they only change how the work is scheduled.

use crate::engine::ResolvedFilter;
use crate::types::CardId;
use crate::universe::Card;

/// Run the three filter phases over a slice of cards
///
/// Phase 1 applies intersection tags rarest-first and short-circuits to
/// the empty set the instant an intermediate result is empty. Phase 2
/// selects by union membership within the Phase-1 result only. Phase 3
/// (exclusion) always runs last so an empty union result can never skip
/// it incorrectly.
///
/// Output preserves the input (dense) order of the cards.
pub(crate) fn scan(cards: &[Card], filter: &ResolvedFilter) -> Vec<CardId> {
    if filter.unsatisfiable {
        return Vec::new();
    }

    // Phase 1: intersection restriction
    let mut current: Vec<&Card> = cards.iter().collect();
    for &tag in &filter.intersection {
        current.retain(|c| c.tags.contains(tag));
        if current.is_empty() {
            return Vec::new();
        }
    }

    // Phase 2: union selection, evaluated within the restricted universe
    if filter.union_required {
        current.retain(|c| c.tags.intersects(&filter.union));
    }

    // Phase 3: exclusion
    if !filter.exclusion.is_empty() {
        current.retain(|c| !c.tags.intersects(&filter.exclusion));
    }

    current.into_iter().map(|c| c.id).collect()
}
