//! Tag interning, selectivity statistics, and bitmap indexing

mod bitmap;
mod interner;

pub use bitmap::{BitmapIndex, BitmapIndexCache, BitmapIter, CardBitmap};
pub use interner::TagInterner;
