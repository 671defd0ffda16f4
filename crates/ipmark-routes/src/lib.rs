//! IPv4 route classification: trie building, table compaction, and runtime
//! matching.
//!
//! Splits the IPv4 address space into two categories — domestic (direct)
//! and foreign (proxied) — from bulk registry allocation data, and compiles
//! the smallest route table that reproduces the classification for a
//! longest-prefix-match lookup.
//!
//! # Architecture
//!
//! - **Trie** ([`IpTrie`]): binary prefix trie with a deterministic overlap
//!   policy and diagnostic reporting through a [`ConflictSink`]
//! - **Compactors** ([`CompactMode`]): a minimum-route dynamic program and
//!   a cheap conservative merge
//! - **Table** ([`table`]): flat `(addr, prefix_len, code)` triples, JSON
//!   on disk
//! - **Matcher** ([`RouteMatcher`], [`HotRouteMatcher`]): O(32)
//!   classification over a rebuilt trie, lock-free hot reload
//! - **Ingestion** ([`parser`], [`provider`]): RIR delegated-stats parsing,
//!   file and HTTP sources
//!
//! # Example
//!
//! ```
//! use ipmark_routes::{CompactMode, Mark, TableCompiler};
//!
//! let mut compiler = TableCompiler::new();
//! compiler.insert_reserved();
//! compiler.insert_cidr("1.0.0.0/8", Mark::Domestic).unwrap();
//! compiler.insert_cidr("8.0.0.0/8", Mark::Foreign).unwrap();
//!
//! let table = compiler.compile(CompactMode::MinRoutes).unwrap();
//! let matcher = table.matcher();
//! assert!(matcher.is_domestic("1.2.3.4".parse().unwrap()));
//! assert!(!matcher.is_domestic("8.8.8.8".parse().unwrap()));
//! ```

pub mod addr;
pub mod compact;
pub mod compiler;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod provider;
pub mod reserved;
pub mod route;
pub mod table;
pub mod trie;

pub use compact::CompactMode;
pub use compiler::{RouteTable, TableCompiler};
pub use error::RoutesError;
pub use matcher::{HotRouteMatcher, RouteMatcher};
pub use parser::Allocation;
pub use route::{Mark, Route};
pub use trie::{Conflict, ConflictSink, IpTrie};
