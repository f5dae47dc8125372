//! SSRF (Server-Side Request Forgery) protection.
//!
//! Sitemap URLs come from untrusted documents (robots.txt, index sitemaps),
//! so every host is checked before a request is made: literal IPs directly,
//! names after DNS resolution.
use std::net::IpAddr;

use url::{Host, Url};

/// Error type for SSRF validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsrfError {
    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Carrier-grade NAT (100.64/10)
/// - Link-local addresses (169.254/16, fe80::/10)
/// - Multicast and broadcast addresses (224/4, ff00::/8)
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 addresses of any of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || octets[0] == 0
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(mapped));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that an IP address is not private or reserved.
pub fn validate_ip(ip: IpAddr) -> Result<(), SsrfError> {
    if is_private_or_reserved(ip) { Err(SsrfError::BlockedIp(ip)) } else { Ok(()) }
}

/// Validate the host of `url`, resolving names through DNS.
///
/// Every resolved address must be public; a single private answer blocks the
/// request.
pub async fn guard_host(url: &Url) -> Result<(), SsrfError> {
    let host = url.host().ok_or_else(|| SsrfError::MissingHost(url.to_string()))?;
    let port = url.port_or_known_default().unwrap_or(443);

    match host {
        Host::Ipv4(v4) => validate_ip(IpAddr::V4(v4)),
        Host::Ipv6(v6) => validate_ip(IpAddr::V6(v6)),
        Host::Domain(name) => {
            let addrs = tokio::net::lookup_host((name, port))
                .await
                .map_err(|e| SsrfError::DnsError(format!("{name}: {e}")))?;
            let mut resolved = false;
            for addr in addrs {
                validate_ip(addr.ip())?;
                resolved = true;
            }
            if resolved { Ok(()) } else { Err(SsrfError::DnsError(format!("{name}: no addresses"))) }
        }
    }
}
