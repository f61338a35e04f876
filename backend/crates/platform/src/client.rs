//! Client identification utilities
//!
//! Resolves the network address used as a throttling key.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Address recorded when no source yields a usable value
///
/// Such requests cannot be attributed to one client, so address-based
/// quotas never apply to it.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded.or(direct_ip)
}

/// Resolve the address string used as a throttling key
///
/// Priority: an address the caller states explicitly, then the forwarded /
/// direct connection address, then [`UNKNOWN_CLIENT`].
pub fn resolve_client_address(
    explicit: Option<&str>,
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
) -> String {
    if let Some(stated) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return stated.to_string();
    }

    extract_client_ip(headers, direct_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
