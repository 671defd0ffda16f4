//! RIR delegated-stats parser.
//!
//! Registries publish their allocations as pipe-delimited lines:
//!
//! ```text
//! apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
//! ```
//!
//! Only IPv4 records for the requested entity code are consumed. Version
//! and summary lines fall out of the entity filter on their own. Malformed
//! records are skipped with a warning; a bad line never aborts ingestion.

use tracing::{debug, warn};

use crate::addr::parse_ipv4;

/// One IPv4 allocation: a base address and the prefix length covering the
/// allocated size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub addr: u32,
    pub prefix_len: u8,
}

/// Parse a delegated-stats file, keeping IPv4 records for `entity`.
pub fn parse_delegated(content: &str, entity: &str) -> Vec<Allocation> {
    let mut out = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('|');
        let (Some(_registry), Some(cc), Some(family), Some(start), Some(value)) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            continue;
        };
        if cc != entity || family != "ipv4" {
            continue;
        }
        let addr = match parse_ipv4(start) {
            Ok(addr) => addr,
            Err(_) => {
                warn!(line, "skipping record with invalid base address");
                continue;
            }
        };
        let count: u64 = match value.parse() {
            Ok(count) => count,
            Err(_) => {
                warn!(line, "skipping record with invalid address count");
                continue;
            }
        };
        let Some(prefix_len) = prefix_for_count(count) else {
            warn!(line, count, "skipping record with out-of-range size");
            continue;
        };
        if !count.is_power_of_two() {
            debug!(line, count, prefix_len, "rounded size up to covering prefix");
        }
        out.push(Allocation { addr, prefix_len });
    }
    out
}

/// Prefix length whose range covers `count` addresses, rounding non-powers
/// of two up to the next power.
fn prefix_for_count(count: u64) -> Option<u8> {
    if count == 0 || count > 1 << 32 {
        return None;
    }
    let bits = count.next_power_of_two().trailing_zeros();
    if bits > 32 {
        return None;
    }
    Some(32 - bits as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_matching_records() {
        let content = "\
apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
apnic|CN|ipv4|1.0.32.0|8192|20110412|allocated
apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated
apnic|CN|ipv6|2001:250::|35|20000426|allocated
apnic|CN|asn|4538|1|19970305|allocated
";
        let allocs = parse_delegated(content, "CN");
        assert_eq!(
            allocs,
            vec![
                Allocation {
                    addr: 0x0100_0100,
                    prefix_len: 24
                },
                Allocation {
                    addr: 0x0100_2000,
                    prefix_len: 19
                },
            ]
        );
    }

    #[test]
    fn skips_header_and_summary_lines() {
        let content = "\
2|apnic|20230225|12345|19830613|20230224|+1000
apnic|*|ipv4|*|53557|summary
apnic|*|asn|*|11947|summary
apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
";
        let allocs = parse_delegated(content, "CN");
        assert_eq!(allocs.len(), 1);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let content = "\
# delegated-apnic-latest

apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
";
        assert_eq!(parse_delegated(content, "CN").len(), 1);
    }

    #[test]
    fn skips_malformed_records() {
        let content = "\
apnic|CN|ipv4|not-an-ip|256|20110414|allocated
apnic|CN|ipv4|1.0.1.0|zero|20110414|allocated
apnic|CN|ipv4|1.0.1.0|0|20110414|allocated
apnic|CN
apnic|CN|ipv4|1.0.2.0|512|20110414|allocated
";
        let allocs = parse_delegated(content, "CN");
        assert_eq!(
            allocs,
            vec![Allocation {
                addr: 0x0100_0200,
                prefix_len: 23
            }]
        );
    }

    #[test]
    fn entity_filter_is_exact() {
        let content = "arin|US|ipv4|3.0.0.0|16777216|19880215|allocated";
        assert_eq!(parse_delegated(content, "US").len(), 1);
        assert!(parse_delegated(content, "CN").is_empty());
        assert!(parse_delegated(content, "us").is_empty());
    }

    #[test]
    fn size_to_prefix_conversion() {
        assert_eq!(prefix_for_count(1), Some(32));
        assert_eq!(prefix_for_count(256), Some(24));
        assert_eq!(prefix_for_count(65536), Some(16));
        assert_eq!(prefix_for_count(1 << 32), Some(0));
        assert_eq!(prefix_for_count(0), None);
        assert_eq!(prefix_for_count((1 << 32) + 1), None);
    }

    #[test]
    fn fractional_sizes_round_up_to_covering_prefix() {
        // 7168 addresses do not fill a prefix; the covering one is a /19.
        assert_eq!(prefix_for_count(7168), Some(19));
        assert_eq!(prefix_for_count(3), Some(30));
    }
}
