//! Conservative merge compaction.
//!
//! Computes, per node, the set of marks present anywhere in its subtree and
//! emits a single route at the shallowest node whose subtree holds at most
//! one substantive mark. Subtrees mixing domestic and foreign marks are
//! always split further. Unexplored space may end up attached to a
//! neighboring mark's route; addresses with an explicit mark never change
//! classification.

use crate::route::{Mark, Route};
use crate::trie::{IpTrie, Node, branch_bit};

/// Set of marks seen in a subtree. Indexed by mark, not a map.
#[derive(Debug, Clone, Copy, Default)]
struct MarkSet([bool; 3]);

impl MarkSet {
    fn insert(&mut self, mark: Mark) {
        self.0[mark.index()] = true;
    }

    fn union(&mut self, other: MarkSet) {
        for (slot, seen) in self.0.iter_mut().zip(other.0) {
            *slot |= seen;
        }
    }

    /// The only substantive mark in the set, if there is exactly one.
    /// `Empty` is ignored.
    fn sole(self) -> Option<Mark> {
        match (self.0[Mark::Domestic.index()], self.0[Mark::Foreign.index()]) {
            (true, false) => Some(Mark::Domestic),
            (false, true) => Some(Mark::Foreign),
            _ => None,
        }
    }

    fn is_mixed(self) -> bool {
        self.0[Mark::Domestic.index()] && self.0[Mark::Foreign.index()]
    }
}

/// Compact the trie into routes by conservative merging.
///
/// Output route count never exceeds the number of marked nodes.
pub fn merge_routes(trie: &IpTrie) -> Vec<Route> {
    let mut out = Vec::new();
    merge_node(trie.root(), 0, 0, &mut out);
    out
}

fn merge_node(node: &Node, addr: u32, depth: u8, out: &mut Vec<Route>) -> MarkSet {
    // Children emit first; if this whole subtree collapses to one mark,
    // their routes are discarded in favor of a single coarser route here.
    let checkpoint = out.len();

    let mut set = MarkSet::default();
    set.insert(node.mark);
    if let Some(left) = &node.children[0] {
        set.union(merge_node(left, addr, depth + 1, out));
    }
    if let Some(right) = &node.children[1] {
        set.union(merge_node(right, addr | branch_bit(depth), depth + 1, out));
    }

    if !set.is_mixed() {
        out.truncate(checkpoint);
        if let Some(mark) = set.sole() {
            out.push(Route::new(addr, depth, mark));
        }
    }
    set
}
