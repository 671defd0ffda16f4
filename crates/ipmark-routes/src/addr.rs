//! Dotted-quad address codec.
//!
//! Addresses are handled as `u32` throughout the compiler, with bit 0 being
//! the most significant bit of the dotted-quad form.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::error::RoutesError;

/// Parse a dotted-quad string into its integer form.
pub fn parse_ipv4(s: &str) -> Result<u32, RoutesError> {
    s.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| RoutesError::InvalidAddr(s.to_string()))
}

/// Format an integer address as a dotted quad.
pub fn format_ipv4(addr: u32) -> String {
    Ipv4Addr::from(addr).to_string()
}

/// Parse an `addr/len` CIDR string into `(base, prefix_len)`.
pub fn parse_cidr(s: &str) -> Result<(u32, u8), RoutesError> {
    let net: Ipv4Net = s
        .parse()
        .map_err(|_| RoutesError::InvalidCidr(s.to_string()))?;
    Ok((u32::from(net.addr()), net.prefix_len()))
}
