//! Runtime address classification.
//!
//! `RouteMatcher` rebuilds a prefix trie from a compiled table and answers
//! lookups in at most 32 steps. It is immutable after construction and safe
//! to share across threads. `HotRouteMatcher` adds lock-free atomic
//! replacement for long-running consumers that reload tables periodically.

use std::net::Ipv4Addr;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::RoutesError;
use crate::route::{Mark, Route};
use crate::table;
use crate::trie::IpTrie;

/// Longest-prefix-match classifier over a compiled route set.
pub struct RouteMatcher {
    trie: IpTrie,
    route_count: usize,
}

impl RouteMatcher {
    /// Build a matcher from compiled routes.
    pub fn from_routes(routes: &[Route]) -> Self {
        let mut trie = IpTrie::new();
        for r in routes {
            trie.set_route(r.addr, r.prefix_len, r.mark);
        }
        Self {
            trie,
            route_count: routes.len(),
        }
    }

    /// Build a matcher from the flat triple encoding.
    pub fn from_flat(flat: &[u32]) -> Result<Self, RoutesError> {
        Ok(Self::from_routes(&table::from_flat(flat)?))
    }

    /// Build a matcher from the JSON table form.
    pub fn from_json(json: &str) -> Result<Self, RoutesError> {
        Ok(Self::from_routes(&table::from_json(json)?))
    }

    /// Classify an address. Returns `Mark::Empty` only when the table has
    /// no route covering it (an empty or partial table).
    pub fn classify(&self, addr: Ipv4Addr) -> Mark {
        self.trie.classify(u32::from(addr))
    }

    /// Classify a dotted-quad string.
    pub fn classify_str(&self, addr: &str) -> Result<Mark, RoutesError> {
        Ok(self.classify(crate::addr::parse_ipv4(addr)?.into()))
    }

    /// True when the address resolves to the domestic category.
    pub fn is_domestic(&self, addr: Ipv4Addr) -> bool {
        self.classify(addr) == Mark::Domestic
    }

    /// Number of routes the matcher was built from.
    pub fn route_count(&self) -> usize {
        self.route_count
    }
}

impl std::fmt::Debug for RouteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatcher")
            .field("routes", &self.route_count)
            .finish()
    }
}

/// A hot-swappable wrapper around [`RouteMatcher`].
///
/// Reads go through an `arc_swap` guard and are wait-free; `update`
/// atomically replaces the whole matcher when a fresh table arrives.
pub struct HotRouteMatcher {
    inner: ArcSwap<RouteMatcher>,
}

impl HotRouteMatcher {
    pub fn new(matcher: RouteMatcher) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(matcher)),
        }
    }

    /// Classify against the current table.
    pub fn classify(&self, addr: Ipv4Addr) -> Mark {
        self.inner.load().classify(addr)
    }

    /// True when the address resolves to the domestic category.
    pub fn is_domestic(&self, addr: Ipv4Addr) -> bool {
        self.inner.load().is_domestic(addr)
    }

    /// Atomically replace the matcher with one built from a new table.
    pub fn update(&self, matcher: RouteMatcher) {
        self.inner.store(Arc::new(matcher));
    }

    /// Route count of the current table.
    pub fn route_count(&self) -> usize {
        self.inner.load().route_count()
    }
}

impl std::fmt::Debug for HotRouteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotRouteMatcher")
            .field("inner", &*self.inner.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::parse_cidr;

    fn route(cidr: &str, mark: Mark) -> Route {
        let (addr, len) = parse_cidr(cidr).unwrap();
        Route::new(addr, len, mark)
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn base_route_with_overrides() {
        let m = RouteMatcher::from_routes(&[
            route("0.0.0.0/0", Mark::Foreign),
            route("10.0.0.0/8", Mark::Domestic),
            route("10.64.0.0/10", Mark::Foreign),
        ]);
        assert_eq!(m.classify(ip("1.2.3.4")), Mark::Foreign);
        assert_eq!(m.classify(ip("10.1.2.3")), Mark::Domestic);
        // The deepest route on the walk wins.
        assert_eq!(m.classify(ip("10.64.0.1")), Mark::Foreign);
        assert_eq!(m.classify(ip("10.128.0.1")), Mark::Domestic);
    }

    #[test]
    fn empty_table_classifies_empty() {
        let m = RouteMatcher::from_routes(&[]);
        assert_eq!(m.classify(ip("8.8.8.8")), Mark::Empty);
        assert!(!m.is_domestic(ip("8.8.8.8")));
        assert_eq!(m.route_count(), 0);
    }

    #[test]
    fn from_flat_matches_from_routes() {
        let routes = vec![
            route("0.0.0.0/0", Mark::Domestic),
            route("8.0.0.0/5", Mark::Foreign),
        ];
        let direct = RouteMatcher::from_routes(&routes);
        let decoded = RouteMatcher::from_flat(&table::to_flat(&routes)).unwrap();
        for probe in ["0.0.0.0", "8.8.8.8", "15.255.255.255", "16.0.0.0", "255.255.255.255"] {
            assert_eq!(
                direct.classify(ip(probe)),
                decoded.classify(ip(probe)),
                "{probe}"
            );
        }
    }

    #[test]
    fn classify_str_parses_and_rejects() {
        let m = RouteMatcher::from_routes(&[route("0.0.0.0/0", Mark::Domestic)]);
        assert_eq!(m.classify_str("9.9.9.9").unwrap(), Mark::Domestic);
        m.classify_str("not-an-ip").unwrap_err();
    }

    #[test]
    fn hot_matcher_swaps_atomically() {
        let hot = HotRouteMatcher::new(RouteMatcher::from_routes(&[route(
            "0.0.0.0/0",
            Mark::Foreign,
        )]));
        assert_eq!(hot.classify(ip("10.0.0.1")), Mark::Foreign);

        hot.update(RouteMatcher::from_routes(&[
            route("0.0.0.0/0", Mark::Foreign),
            route("10.0.0.0/8", Mark::Domestic),
        ]));
        assert_eq!(hot.classify(ip("10.0.0.1")), Mark::Domestic);
        assert_eq!(hot.route_count(), 2);
    }

    #[test]
    fn matcher_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteMatcher>();
        assert_send_sync::<HotRouteMatcher>();
    }
}
