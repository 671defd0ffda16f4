//! # ipmark
//!
//! IPv4 route classification: compile bulk registry allocation data into a
//! compact route table and classify addresses against it at runtime.
//!
//! ## Crates
//!
//! - [`ipmark_routes`] - Trie, compaction, table encoding, runtime matcher
//! - [`ipmark_gen`] - Batch compiler binary

pub use ipmark_gen as generator;
pub use ipmark_routes as routes;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ipmark_routes::{
        CompactMode, HotRouteMatcher, Mark, Route, RouteMatcher, RouteTable, TableCompiler,
    };
}
