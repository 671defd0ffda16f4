//! Error types for the table generator.

use thiserror::Error;

/// Errors that can occur while generating a route table.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("routes error: {0}")]
    Routes(#[from] ipmark_routes::RoutesError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
