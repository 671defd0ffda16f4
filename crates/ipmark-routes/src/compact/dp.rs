//! Minimum-route compaction.
//!
//! Bottom-up dynamic program over the trie: for every node and every mark
//! the node could inherit from above, compute the fewest routes needed to
//! reproduce the subtree's exact classification, then reconstruct the
//! chosen routes top-down. Unexplored address space costs nothing and is
//! absorbed by whichever neighboring mark makes the total smallest.

use crate::error::RoutesError;
use crate::route::{Mark, Route};
use crate::trie::{IpTrie, Node, branch_bit};

/// Sentinel cost for choices that cannot reproduce the classification,
/// e.g. assuming a marked leaf inherits a different mark. Large enough to
/// never win a minimum, small enough that sums cannot overflow.
const INFEASIBLE: u32 = 0x7fff;

/// Route count and the minimizing child-mark pair for one inherited mark.
#[derive(Debug, Clone, Copy)]
struct Solution {
    count: u32,
    children: [Mark; 2],
}

impl Default for Solution {
    fn default() -> Self {
        Self {
            count: INFEASIBLE,
            children: [Mark::Empty; 2],
        }
    }
}

/// Per-node solutions, indexed by inherited mark. Mirrors the trie's shape
/// for the duration of one compaction and is dropped after reconstruction.
struct Solved {
    sols: [Solution; 3],
    children: [Option<Box<Solved>>; 2],
}

/// Solutions for an absent subtree: empty space is free to classify either
/// way, expressed as a zero-cost `Empty` child-mark choice.
fn absent() -> [Solution; 3] {
    let mut sols = [Solution::default(); 3];
    sols[Mark::Empty.index()].count = 0;
    sols
}

fn solve(node: &Node) -> Box<Solved> {
    if node.mark.is_set() {
        // An explicit mark prices this subtree at exactly one route, and
        // only under its own mark.
        let mut sols = [Solution::default(); 3];
        sols[node.mark.index()].count = 1;
        return Box::new(Solved {
            sols,
            children: [None, None],
        });
    }

    let children = node.children.each_ref().map(|c| c.as_deref().map(solve));
    let left = children[0].as_ref().map_or_else(absent, |s| s.sols);
    let right = children[1].as_ref().map_or_else(absent, |s| s.sols);

    let mut sols = [Solution::default(); 3];
    for cur in [Mark::Domestic, Mark::Foreign] {
        let best = &mut sols[cur.index()];
        // Fixed scan order with a strict minimum: the first minimizing pair
        // wins, keeping the emitted routes deterministic across runs.
        for l in Mark::ALL {
            for r in Mark::ALL {
                let mut count = left[l.index()].count + right[r.index()].count;
                if l == r && cur == l {
                    // Both children inherit `cur` as-is; the route that
                    // would establish it is hoisted to the parent.
                    count -= 1;
                } else if cur != l && cur != r {
                    // Neither child continues `cur`; this node needs its
                    // own route to establish it.
                    count += 1;
                }
                if count < best.count {
                    *best = Solution {
                        count,
                        children: [l, r],
                    };
                }
            }
        }
    }
    Box::new(Solved { sols, children })
}

fn emit(
    solved: Option<&Solved>,
    addr: u32,
    depth: u8,
    mark: Mark,
    parent: Mark,
    out: &mut Vec<Route>,
) {
    let Some(s) = solved else { return };
    if mark != parent {
        out.push(Route::new(addr, depth, mark));
    }
    if depth == 32 {
        return;
    }
    let [l, r] = s.sols[mark.index()].children;
    emit(s.children[0].as_deref(), addr, depth + 1, l, mark, out);
    emit(
        s.children[1].as_deref(),
        addr | branch_bit(depth),
        depth + 1,
        r,
        mark,
        out,
    );
}

/// Compact the trie into a minimum-count route list.
///
/// The first route always covers the whole address space with the cheaper
/// root mark (foreign on a tie). A sentinel-valued root cost means the trie
/// violates the builder's invariants; that fails the run rather than
/// emitting a wrong table.
pub fn min_routes(trie: &IpTrie) -> Result<Vec<Route>, RoutesError> {
    let solved = solve(trie.root());
    let domestic = solved.sols[Mark::Domestic.index()].count;
    let foreign = solved.sols[Mark::Foreign.index()].count;
    let root_mark = if domestic < foreign {
        Mark::Domestic
    } else {
        Mark::Foreign
    };
    let best = solved.sols[root_mark.index()].count;
    if best >= INFEASIBLE {
        return Err(RoutesError::Infeasible(best));
    }

    let mut out = Vec::new();
    emit(Some(solved.as_ref()), 0, 0, root_mark, Mark::Empty, &mut out);
    Ok(out)
}
