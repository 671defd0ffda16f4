//! File-based allocation provider.

use std::path::Path;

use crate::error::RoutesError;
use crate::parser::{Allocation, parse_delegated};

/// Provider that loads a delegated-stats snapshot from a local file.
pub struct FileProvider;

impl FileProvider {
    /// Load and parse a snapshot, keeping IPv4 records for `entity`.
    pub fn load(path: &Path, entity: &str) -> Result<Vec<Allocation>, RoutesError> {
        let content = std::fs::read_to_string(path)?;
        Ok(parse_delegated(&content, entity))
    }
}
