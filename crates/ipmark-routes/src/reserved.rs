//! Fixed address-space reservations.

use ipnet::Ipv4Net;

/// Private and special-use ranges that must always classify as domestic so
/// clients reach them directly, never through the proxy. Kept at /24 or
/// coarser to avoid fragmenting the compiled table.
pub const RESERVED_RANGES: [&str; 14] = [
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.88.99.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
];

/// The reservation list as parsed networks, in insertion order.
pub fn reserved_nets() -> Vec<Ipv4Net> {
    RESERVED_RANGES
        .iter()
        .map(|cidr| cidr.parse().expect("built-in CIDR is valid"))
        .collect()
}
