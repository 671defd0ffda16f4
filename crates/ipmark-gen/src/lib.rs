//! Batch compiler for the IPv4 route classification table.
//!
//! Fetches the delegation files of the two address-owning registries,
//! builds the marked prefix trie, compacts it, and writes the JSON route
//! table consumed by runtime matchers.
//!
//! # Usage
//!
//! ```bash
//! ipmark-gen --out routes.json --mode min-routes
//! ```
//!
//! Local snapshots can stand in for the remote files with
//! `--domestic-file` / `--foreign-file`, which keeps compilation fully
//! offline and reproducible.

pub mod cli;
pub mod error;

pub use cli::GenArgs;
pub use error::GenError;
