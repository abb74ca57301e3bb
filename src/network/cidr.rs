//! CIDR containment.
//!
//! Answers "does this address (or block) sit inside that block", the way
//! subnet placement is verified after a deployment.

use crate::error::CidrError;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Parse either a bare address (as a single-host block) or a CIDR block.
pub fn parse_network(s: &str) -> Result<IpNetwork, CidrError> {
    let s = s.trim();

    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(IpNetwork::from(ip));
    }

    s.parse::<IpNetwork>()
        .map_err(|_| CidrError::InvalidNetwork(s.to_string()))
}

/// Check whether every address of `inner` lies within `outer`.
///
/// `inner` may be an address or a block; `outer` may be either too. An IPv4
/// block is never inside an IPv6 one, and vice versa.
pub fn cidr_contains(inner: &str, outer: &str) -> Result<bool, CidrError> {
    let inner = parse_network(inner)?;
    let outer = parse_network(outer)?;

    let contained = match (inner, outer) {
        (IpNetwork::V4(i), IpNetwork::V4(o)) => {
            i.prefix() >= o.prefix() && o.contains(i.network())
        }
        (IpNetwork::V6(i), IpNetwork::V6(o)) => {
            i.prefix() >= o.prefix() && o.contains(i.network())
        }
        _ => false,
    };
    Ok(contained)
}
