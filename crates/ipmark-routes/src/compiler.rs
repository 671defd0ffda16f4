//! Table compilation pipeline.
//!
//! `TableCompiler` owns the trie for one batch run and collects every
//! insertion conflict. Sources must be applied in the documented order —
//! fixed reservations, then domestic allocations, then foreign allocations —
//! to get the deterministic overlap resolution instead of silent data loss.
//! Retrieval of the raw datasets may happen concurrently; their application
//! here is strictly sequential.

use tracing::{debug, warn};

use crate::addr::parse_cidr;
use crate::compact::{self, CompactMode};
use crate::error::RoutesError;
use crate::matcher::RouteMatcher;
use crate::parser::Allocation;
use crate::reserved::reserved_nets;
use crate::route::{Mark, Route};
use crate::table;
use crate::trie::{Conflict, ConflictSink, IpTrie};

/// Sink that records each conflict and logs it as a structured warning.
struct WarnSink<'a>(&'a mut Vec<Conflict>);

impl ConflictSink for WarnSink<'_> {
    fn report(&mut self, conflict: Conflict) {
        warn!(%conflict, "resolved insertion conflict");
        self.0.push(conflict);
    }
}

/// Builder for one compilation run.
pub struct TableCompiler {
    trie: IpTrie,
    conflicts: Vec<Conflict>,
    inserted: usize,
}

impl TableCompiler {
    pub fn new() -> Self {
        Self {
            trie: IpTrie::new(),
            conflicts: Vec::new(),
            inserted: 0,
        }
    }

    /// Insert the fixed always-domestic reservations. Call this before any
    /// bulk data so the reservations win the overlap policy.
    pub fn insert_reserved(&mut self) -> &mut Self {
        for net in reserved_nets() {
            self.trie.insert(
                u32::from(net.addr()),
                net.prefix_len(),
                Mark::Domestic,
                &mut WarnSink(&mut self.conflicts),
            );
            self.inserted += 1;
        }
        self
    }

    /// Insert one batch of parsed allocations under a single mark.
    pub fn insert_allocations(&mut self, allocations: &[Allocation], mark: Mark) -> &mut Self {
        for alloc in allocations {
            self.trie.insert(
                alloc.addr,
                alloc.prefix_len,
                mark,
                &mut WarnSink(&mut self.conflicts),
            );
        }
        self.inserted += allocations.len();
        debug!(
            count = allocations.len(),
            %mark,
            nodes = self.trie.node_count(),
            "applied allocation batch"
        );
        self
    }

    /// Insert a single CIDR block.
    pub fn insert_cidr(&mut self, cidr: &str, mark: Mark) -> Result<&mut Self, RoutesError> {
        let (addr, prefix_len) = parse_cidr(cidr)?;
        self.trie
            .insert(addr, prefix_len, mark, &mut WarnSink(&mut self.conflicts));
        self.inserted += 1;
        Ok(self)
    }

    /// Conflicts resolved so far, in insertion order.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Number of blocks inserted so far, conflicting ones included.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// The trie built so far.
    pub fn trie(&self) -> &IpTrie {
        &self.trie
    }

    /// Compact the built trie into a route table.
    pub fn compile(&self, mode: CompactMode) -> Result<RouteTable, RoutesError> {
        let routes = compact::compact(&self.trie, mode)?;
        debug!(
            inserted = self.inserted,
            conflicts = self.conflicts.len(),
            routes = routes.len(),
            ?mode,
            "compiled route table"
        );
        Ok(RouteTable { routes })
    }
}

impl Default for TableCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled, immutable route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// The compiled routes, in emission order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Flat `(addr, prefix_len, code)` triples.
    pub fn to_flat(&self) -> Vec<u32> {
        table::to_flat(&self.routes)
    }

    /// JSON table form for distribution.
    pub fn to_json(&self) -> String {
        table::to_json(&self.routes)
    }

    /// Build a runtime matcher from this table.
    pub fn matcher(&self) -> RouteMatcher {
        RouteMatcher::from_routes(&self.routes)
    }
}
