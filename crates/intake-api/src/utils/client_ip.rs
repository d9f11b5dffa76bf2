//! Client IP extraction
//!
//! Resolves the caller's source key for rate limiting: a validated
//! X-Forwarded-For hop, then X-Real-IP, then the connection address, then
//! `"unknown"`. Forwarded headers are only trusted up to the configured
//! proxy hop count so a client cannot spoof its way out of its own bucket.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::state::AppState;

/// The caller's source key, as an extractor. Infallible: a request with no
/// derivable address rate-limits under the shared `"unknown"` key rather
/// than being rejected.
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(extract_client_ip(
            &parts.headers,
            socket_addr.as_ref(),
            state.config.trusted_proxy_count,
        )))
    }
}

/// Extract and validate the client IP from headers, falling back to the
/// socket address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(header_value) = forwarded_for.to_str() {
            let ip = extract_from_forwarded_for(header_value, trusted_proxy_count);
            if ip != "unknown" {
                return ip;
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(header_value) = real_ip.to_str() {
            let trimmed = header_value.trim();
            if is_valid_ip(trimmed) {
                return trimmed.to_string();
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Pick the client hop out of an X-Forwarded-For chain
/// (`client, proxy1, proxy2, ...`): the entry just before the trailing
/// `trusted_proxy_count` trusted hops.
fn extract_from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> String {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if ips.is_empty() {
        return "unknown".to_string();
    }

    // With no trusted proxies the whole header could be spoofed; use the
    // hop closest to us, validated.
    let position = if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        ips.len() - 1
    } else {
        ips.len() - trusted_proxy_count - 1
    };

    let candidate = ips[position];
    if is_valid_ip(candidate) {
        return candidate.to_string();
    }

    "unknown".to_string()
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}
