//! Client IP extraction
//!
//! The service is expected to run behind a trusted reverse proxy, so the
//! first `X-Forwarded-For` entry wins; the socket address is the fallback
//! for direct connections.

use axum::http::HeaderMap;
use std::net::IpAddr;

pub fn client_ip(headers: &HeaderMap, socket_addr: IpAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .unwrap_or(socket_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_falls_back_to_socket_address() {
        let headers = HeaderMap::new();
        let socket: IpAddr = "192.168.1.1".parse().unwrap();
        assert_eq!(client_ip(&headers, socket), socket);
    }

    #[test]
    fn test_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        let socket: IpAddr = "192.168.1.1".parse().unwrap();
        assert_eq!(
            client_ip(&headers, socket),
            "203.0.113.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_garbage_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let socket: IpAddr = "192.168.1.1".parse().unwrap();
        assert_eq!(client_ip(&headers, socket), socket);
    }
}
