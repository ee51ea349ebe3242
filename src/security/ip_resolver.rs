use crate::core::error::ErrorCode;
use crate::validation::params::Query;
use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Proxy headers consulted in priority order
const FORWARD_HEADERS: [&str; 2] = ["x-real-ip", "x-forwarded-for"];

/// Determine the announcing peer's address.
///
/// First match wins:
/// 1. `ip`, `ipv4`, `ipv6` query overrides, only when `allow_client_ip`
/// 2. `X-Real-IP`, then the first `X-Forwarded-For` entry
/// 3. the transport remote address
///
/// Unparsable candidates are skipped.
pub fn resolve_ip(
    query: &Query,
    headers: &HeaderMap,
    remote_addr: &str,
    allow_client_ip: bool,
) -> Result<IpAddr, ErrorCode> {
    if allow_client_ip {
        let overrides = [query.ip.as_deref(), query.ipv4.as_deref(), query.ipv6.as_deref()];
        for value in overrides {
            if let Some(ip) = value.and_then(|v| v.trim().parse::<IpAddr>().ok()) {
                return Ok(ip);
            }
        }
    }

    for name in FORWARD_HEADERS {
        let candidate = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = candidate {
            return Ok(ip);
        }
    }

    parse_remote_addr(remote_addr).ok_or(ErrorCode::GenericError)
}

/// Parse a `host:port` remote address, deciding the family by whether a
/// colon or a dot appears first
pub fn parse_remote_addr(remote: &str) -> Option<IpAddr> {
    let first_sep = remote.bytes().find(|b| *b == b'.' || *b == b':')?;

    if first_sep == b'.' {
        let host = remote.split(':').next()?;
        return host.parse::<Ipv4Addr>().ok().map(IpAddr::V4);
    }

    let host = match remote.strip_prefix('[') {
        Some(rest) => rest.split(']').next()?,
        None => remote,
    };
    host.parse::<Ipv6Addr>().ok().map(IpAddr::V6)
}
