//! Flat route-table encoding.
//!
//! The distributable form is a flat sequence of integers, three per route:
//! `(addr, prefix_len, code)` with codes 1 = domestic and 2 = foreign. On
//! disk it is a plain JSON array, small enough to ship inside a client
//! bundle; consumers rebuild a matcher trie from it.

use crate::error::RoutesError;
use crate::route::{Mark, Route, prefix_mask};

/// Flatten routes into `(addr, prefix_len, code)` triples.
pub fn to_flat(routes: &[Route]) -> Vec<u32> {
    let mut flat = Vec::with_capacity(routes.len() * 3);
    for r in routes {
        flat.push(r.addr);
        flat.push(u32::from(r.prefix_len));
        flat.push(r.mark.code());
    }
    flat
}

/// Decode a flat triple sequence back into routes.
///
/// Rejects misaligned input, out-of-range prefix lengths, and mark codes
/// that are not a substantive category. Host bits beyond the prefix are
/// cleared rather than rejected.
pub fn from_flat(flat: &[u32]) -> Result<Vec<Route>, RoutesError> {
    if flat.len() % 3 != 0 {
        return Err(RoutesError::Table(format!(
            "length {} is not a multiple of 3",
            flat.len()
        )));
    }
    let mut routes = Vec::with_capacity(flat.len() / 3);
    for triple in flat.chunks_exact(3) {
        let [addr, prefix_len, code] = [triple[0], triple[1], triple[2]];
        if prefix_len > 32 {
            return Err(RoutesError::Table(format!(
                "prefix length {prefix_len} out of range"
            )));
        }
        let mark = Mark::from_code(code)
            .ok_or_else(|| RoutesError::Table(format!("invalid mark code {code}")))?;
        let prefix_len = prefix_len as u8;
        routes.push(Route {
            addr: addr & prefix_mask(prefix_len),
            prefix_len,
            mark,
        });
    }
    Ok(routes)
}

/// Encode routes as the JSON table shipped to consumers.
pub fn to_json(routes: &[Route]) -> String {
    serde_json::to_string(&to_flat(routes)).expect("integer array always serializes")
}

/// Decode a JSON table.
pub fn from_json(json: &str) -> Result<Vec<Route>, RoutesError> {
    let flat: Vec<u32> = serde_json::from_str(json)?;
    from_flat(&flat)
}
