//! Parsers for allocation-record sources.

mod rir;

pub use rir::{Allocation, parse_delegated};
