//! Binary prefix trie over the IPv4 address space.
//!
//! The trie is built once per compilation run by repeated insertion and is
//! then read-only: the compactors walk it to emit routes and the matcher
//! walks it to classify addresses. Depth 0 is the whole address space,
//! depth 32 a single address. Each node owns its two child slots; there is
//! no sharing and no arena.

use crate::addr::format_ipv4;
use crate::route::Mark;

/// A resolved insertion conflict.
///
/// Conflicts are never fatal: each one is resolved by a fixed policy and
/// reported through a [`ConflictSink`], and compilation continues. Callers
/// get the documented behavior only when they insert broadest-first:
/// fixed reservations, then domestic allocations, then foreign allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// The exact prefix was already marked. The existing mark wins.
    AlreadyMarked {
        addr: u32,
        prefix_len: u8,
        kept: Mark,
        dropped: Mark,
    },
    /// A coarser block arrived after finer structure already subdivided it.
    /// The mark is pushed one level down into the unmarked children so the
    /// coarser intent survives beneath the existing structure.
    SplitUnderFiner {
        addr: u32,
        prefix_len: u8,
        mark: Mark,
    },
    /// A narrower block arrived beneath an already-marked coarser block.
    /// The coarser mark already claims the whole subtree; the insertion is
    /// dropped rather than silently overriding it.
    DroppedUnderCoarser {
        addr: u32,
        prefix_len: u8,
        dropped: Mark,
        covering: Mark,
    },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Conflict::AlreadyMarked {
                addr,
                prefix_len,
                kept,
                dropped,
            } => write!(
                f,
                "{}/{} already marked {kept}, dropping {dropped}",
                format_ipv4(addr),
                prefix_len
            ),
            Conflict::SplitUnderFiner {
                addr,
                prefix_len,
                mark,
            } => write!(
                f,
                "{}/{} {mark} arrived over finer ranges, splitting down",
                format_ipv4(addr),
                prefix_len
            ),
            Conflict::DroppedUnderCoarser {
                addr,
                prefix_len,
                dropped,
                covering,
            } => write!(
                f,
                "{}/{} {dropped} is covered by a {covering} range, dropping",
                format_ipv4(addr),
                prefix_len
            ),
        }
    }
}

/// Destination for insertion-conflict diagnostics.
pub trait ConflictSink {
    fn report(&mut self, conflict: Conflict);
}

impl ConflictSink for Vec<Conflict> {
    fn report(&mut self, conflict: Conflict) {
        self.push(conflict);
    }
}

/// Sink that drops all diagnostics.
pub struct IgnoreConflicts;

impl ConflictSink for IgnoreConflicts {
    fn report(&mut self, _conflict: Conflict) {}
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) mark: Mark,
    pub(crate) children: [Option<Box<Node>>; 2],
}

impl Node {
    fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }
}

/// The address-space prefix trie.
#[derive(Debug, Default)]
pub struct IpTrie {
    root: Node,
}

/// Bit selecting the branch taken at `depth`. Valid for `depth < 32`.
pub(crate) fn branch_bit(depth: u8) -> u32 {
    debug_assert!(depth < 32);
    1 << (31 - depth)
}

impl IpTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn root(&self) -> &Node {
        &self.root
    }

    /// Insert a marked CIDR block, resolving overlaps per the builder's
    /// conflict policy.
    ///
    /// Only the top `prefix_len` bits of `addr` are inspected; low bits are
    /// don't-care. `mark` must not be `Empty` and `prefix_len` must be at
    /// most 32.
    pub fn insert(&mut self, addr: u32, prefix_len: u8, mark: Mark, sink: &mut dyn ConflictSink) {
        assert!(prefix_len <= 32, "prefix length out of range");
        assert!(mark.is_set(), "cannot insert an empty mark");
        insert_at(&mut self.root, addr, 0, prefix_len, mark, sink);
    }

    /// Set a route mark without conflict handling, overwriting any existing
    /// mark at that exact depth.
    ///
    /// This is the rebuild path for matchers constructed from a compiled
    /// table, whose routes are already conflict-free.
    pub fn set_route(&mut self, addr: u32, prefix_len: u8, mark: Mark) {
        assert!(prefix_len <= 32, "prefix length out of range");
        let mut node = &mut self.root;
        for depth in 0..prefix_len {
            let bit = usize::from(addr & branch_bit(depth) != 0);
            node = node.children[bit].get_or_insert_default();
        }
        node.mark = mark;
    }

    /// Classify an address by longest-prefix match with inheritance.
    ///
    /// Walks down one bit at a time; every marked node visited overrides the
    /// inherited mark for the rest of the walk. Returns `Mark::Empty` only
    /// when no ancestor of the address carries a mark.
    pub fn classify(&self, addr: u32) -> Mark {
        let mut inherited = Mark::Empty;
        let mut node = &self.root;
        let mut depth = 0u8;
        loop {
            if node.mark.is_set() {
                inherited = node.mark;
            }
            if depth == 32 {
                return inherited;
            }
            let bit = usize::from(addr & branch_bit(depth) != 0);
            match &node.children[bit] {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => return inherited,
            }
        }
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            1 + node
                .children
                .iter()
                .flatten()
                .map(|c| count(c))
                .sum::<usize>()
        }
        count(&self.root)
    }
}

fn insert_at(
    node: &mut Node,
    addr: u32,
    depth: u8,
    prefix_len: u8,
    mark: Mark,
    sink: &mut dyn ConflictSink,
) {
    if depth == prefix_len {
        if node.mark.is_set() {
            sink.report(Conflict::AlreadyMarked {
                addr,
                prefix_len,
                kept: node.mark,
                dropped: mark,
            });
            return;
        }
        if node.has_children() {
            sink.report(Conflict::SplitUnderFiner {
                addr,
                prefix_len,
                mark,
            });
            for bit in 0..2u8 {
                let child = node.children[usize::from(bit)].get_or_insert_default();
                let child_addr = addr | (u32::from(bit) << (31 - depth));
                insert_at(child, child_addr, depth + 1, prefix_len + 1, mark, sink);
            }
            return;
        }
        node.mark = mark;
        return;
    }
    if node.mark.is_set() {
        sink.report(Conflict::DroppedUnderCoarser {
            addr,
            prefix_len,
            dropped: mark,
            covering: node.mark,
        });
        return;
    }
    let bit = usize::from(addr & branch_bit(depth) != 0);
    let child = node.children[bit].get_or_insert_default();
    insert_at(child, addr, depth + 1, prefix_len, mark, sink);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::{parse_cidr, parse_ipv4};

    fn insert_cidr(trie: &mut IpTrie, cidr: &str, mark: Mark, sink: &mut Vec<Conflict>) {
        let (addr, len) = parse_cidr(cidr).unwrap();
        trie.insert(addr, len, mark, sink);
    }

    fn classify(trie: &IpTrie, addr: &str) -> Mark {
        trie.classify(parse_ipv4(addr).unwrap())
    }

    #[test]
    fn insert_and_classify_round_trip() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Domestic, &mut sink);
        insert_cidr(&mut trie, "8.8.8.0/24", Mark::Foreign, &mut sink);
        assert!(sink.is_empty());

        assert_eq!(classify(&trie, "10.0.0.0"), Mark::Domestic);
        assert_eq!(classify(&trie, "10.255.255.255"), Mark::Domestic);
        assert_eq!(classify(&trie, "8.8.8.8"), Mark::Foreign);
        assert_eq!(classify(&trie, "8.8.9.8"), Mark::Empty);
        assert_eq!(classify(&trie, "11.0.0.0"), Mark::Empty);
    }

    #[test]
    fn classify_single_address_prefix() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "1.2.3.4/32", Mark::Foreign, &mut sink);
        assert_eq!(classify(&trie, "1.2.3.4"), Mark::Foreign);
        assert_eq!(classify(&trie, "1.2.3.5"), Mark::Empty);
    }

    #[test]
    fn host_bits_are_dont_care() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        // Base address with bits set past the prefix; only the top 24 count.
        trie.insert(parse_ipv4("7.7.7.9").unwrap(), 24, Mark::Domestic, &mut sink);
        assert_eq!(classify(&trie, "7.7.7.200"), Mark::Domestic);
        assert_eq!(classify(&trie, "7.7.8.0"), Mark::Empty);
    }

    #[test]
    fn duplicate_mark_first_writer_wins() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Domestic, &mut sink);
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Foreign, &mut sink);

        assert_eq!(classify(&trie, "10.1.2.3"), Mark::Domestic);
        assert_eq!(
            sink,
            vec![Conflict::AlreadyMarked {
                addr: parse_ipv4("10.0.0.0").unwrap(),
                prefix_len: 8,
                kept: Mark::Domestic,
                dropped: Mark::Foreign,
            }]
        );
    }

    #[test]
    fn narrower_under_marked_coarser_is_dropped() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Domestic, &mut sink);
        insert_cidr(&mut trie, "10.1.0.0/16", Mark::Foreign, &mut sink);

        // The coarser mark claims the subtree; the late narrower insert is
        // rejected, not silently spliced in.
        assert_eq!(classify(&trie, "10.1.2.3"), Mark::Domestic);
        assert_eq!(classify(&trie, "10.2.2.3"), Mark::Domestic);
        assert_eq!(sink.len(), 1);
        assert!(matches!(sink[0], Conflict::DroppedUnderCoarser { .. }));
    }

    #[test]
    fn coarser_after_finer_splits_down() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "10.1.0.0/16", Mark::Foreign, &mut sink);
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Domestic, &mut sink);

        // The narrower earlier range keeps its mark; the coarser mark is
        // split down around it so the rest of the /8 is still covered.
        assert_eq!(classify(&trie, "10.1.2.3"), Mark::Foreign);
        assert_eq!(classify(&trie, "10.2.2.3"), Mark::Domestic);
        assert_eq!(classify(&trie, "10.200.0.1"), Mark::Domestic);
        assert!(
            sink.iter()
                .any(|c| matches!(c, Conflict::SplitUnderFiner { .. }))
        );
    }

    #[test]
    fn split_recurses_past_nested_structure() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "10.0.0.0/16", Mark::Foreign, &mut sink);
        insert_cidr(&mut trie, "10.128.0.0/16", Mark::Foreign, &mut sink);
        insert_cidr(&mut trie, "10.0.0.0/8", Mark::Domestic, &mut sink);

        assert_eq!(classify(&trie, "10.0.1.1"), Mark::Foreign);
        assert_eq!(classify(&trie, "10.128.1.1"), Mark::Foreign);
        // Both halves of the /8 contain finer structure; the domestic mark
        // must sink beneath each of them.
        assert_eq!(classify(&trie, "10.64.0.1"), Mark::Domestic);
        assert_eq!(classify(&trie, "10.192.0.1"), Mark::Domestic);
    }

    #[test]
    fn insertion_is_deterministic() {
        let build = || {
            let mut trie = IpTrie::new();
            let mut sink = Vec::new();
            for (cidr, mark) in [
                ("10.1.0.0/16", Mark::Foreign),
                ("10.0.0.0/8", Mark::Domestic),
                ("10.1.0.0/16", Mark::Domestic),
                ("172.16.0.0/12", Mark::Domestic),
            ] {
                insert_cidr(&mut trie, cidr, mark, &mut sink);
            }
            (trie, sink)
        };
        let (a, sink_a) = build();
        let (b, sink_b) = build();
        assert_eq!(sink_a, sink_b);
        for addr in ["10.1.2.3", "10.2.2.3", "172.16.0.1", "172.32.0.1", "9.9.9.9"] {
            assert_eq!(classify(&a, addr), classify(&b, addr), "{addr}");
        }
    }

    #[test]
    fn set_route_overwrites() {
        let mut trie = IpTrie::new();
        trie.set_route(parse_ipv4("10.0.0.0").unwrap(), 8, Mark::Domestic);
        trie.set_route(parse_ipv4("10.0.0.0").unwrap(), 8, Mark::Foreign);
        assert_eq!(classify(&trie, "10.1.2.3"), Mark::Foreign);
    }

    #[test]
    fn set_route_depth_zero_marks_root() {
        let mut trie = IpTrie::new();
        trie.set_route(0, 0, Mark::Foreign);
        assert_eq!(classify(&trie, "1.2.3.4"), Mark::Foreign);
        assert_eq!(classify(&trie, "255.0.0.1"), Mark::Foreign);
    }

    #[test]
    fn deeper_route_refines_broader() {
        let mut trie = IpTrie::new();
        trie.set_route(0, 0, Mark::Foreign);
        trie.set_route(parse_ipv4("192.168.0.0").unwrap(), 16, Mark::Domestic);
        assert_eq!(classify(&trie, "192.168.3.4"), Mark::Domestic);
        assert_eq!(classify(&trie, "192.169.0.0"), Mark::Foreign);
    }

    #[test]
    fn empty_trie_classifies_empty() {
        let trie = IpTrie::new();
        assert_eq!(classify(&trie, "1.2.3.4"), Mark::Empty);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn node_count_grows_with_depth() {
        let mut trie = IpTrie::new();
        let mut sink = Vec::new();
        insert_cidr(&mut trie, "128.0.0.0/1", Mark::Domestic, &mut sink);
        assert_eq!(trie.node_count(), 2);
        insert_cidr(&mut trie, "0.0.0.0/2", Mark::Foreign, &mut sink);
        assert_eq!(trie.node_count(), 4);
    }
}
