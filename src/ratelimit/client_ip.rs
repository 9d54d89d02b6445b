use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Sentinel bucket for requests with no extractable client IP. Such
/// requests share one low-trust key instead of bypassing the limiter.
pub const UNKNOWN_IP: &str = "unknown";

/// Resolve the client IP for rate-limit key construction.
///
/// Proxy headers are consulted only when `trust_proxy` is set; an attacker
/// who controls X-Forwarded-For could otherwise rotate keys at will.
/// Precedence under trust: first entry of X-Forwarded-For, then X-Real-IP,
/// then the transport-level peer address.
pub fn client_ip(trust_proxy: bool, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return forwarded.to_string();
        }
        if let Some(real_ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return real_ip.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:44312".parse().unwrap())
    }

    #[test]
    fn untrusted_proxy_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(client_ip(false, &headers, peer()), "10.0.0.9");
    }

    #[test]
    fn forwarded_for_takes_first_entry_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1, 10.0.0.2"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(true, &headers, peer()), "203.0.113.7");
    }

    #[test]
    fn real_ip_used_when_no_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(true, &headers, peer()), "198.51.100.2");
    }

    #[test]
    fn falls_back_to_peer_then_sentinel() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(true, &headers, peer()), "10.0.0.9");
        assert_eq!(client_ip(true, &headers, None), UNKNOWN_IP);
        assert_eq!(client_ip(false, &headers, None), UNKNOWN_IP);
    }
}
