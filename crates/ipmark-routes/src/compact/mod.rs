//! Route compaction: turn a built trie into an ordered route list.

mod dp;
mod merge;

pub use dp::min_routes;
pub use merge::merge_routes;

use crate::error::RoutesError;
use crate::route::Route;
use crate::trie::IpTrie;

/// Compaction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactMode {
    /// Minimum-route dynamic program: fewest routes reproducing the exact
    /// classification.
    MinRoutes,
    /// Conservative bottom-up merge: cheap and correctness-preserving, but
    /// not cost-optimal.
    Merge,
}

/// Compact a trie into routes using the selected strategy.
pub fn compact(trie: &IpTrie, mode: CompactMode) -> Result<Vec<Route>, RoutesError> {
    match mode {
        CompactMode::MinRoutes => min_routes(trie),
        CompactMode::Merge => Ok(merge_routes(trie)),
    }
}
