//! Error types for the route compiler.

use thiserror::Error;

/// Errors that can occur while compiling or loading a route table.
#[derive(Error, Debug)]
pub enum RoutesError {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddr(String),

    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("invalid route table: {0}")]
    Table(String),

    #[error("no feasible route assignment at the root (cost {0:#x})")]
    Infeasible(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),
}
