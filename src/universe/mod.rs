//! The card universe: cards, tag sets, and copy-on-write snapshots

mod card;
mod snapshot;

pub use card::{Card, TagSet};
pub use snapshot::{CardUniverse, UniverseSnapshot, UniverseStatsSnapshot};
