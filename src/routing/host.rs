//! Virtual host extraction.
//!
//! # Responsibilities
//! - Pick the requested authority (Host header, else the URI authority)
//! - Strip an optional `:port` suffix
//! - Unwrap bracketed IPv6 literals (`[::1]:8443` → `::1`)
//!
//! # Design Decisions
//! - No case folding; route table keys must match what clients send
//! - An unbracketed value with several colons is an IPv6 literal without a
//!   port and is returned whole
//! - Absent or empty host means "no host", which the dispatcher treats as a miss

use axum::http::{header, Request};

/// The raw authority the client asked for, port included.
pub fn requested_authority<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

/// Strip the port from a `Host` value, returning the routing key.
pub fn normalize_host(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(rest) = raw.strip_prefix('[') {
        // `[v6]` or `[v6]:port`; anything else is malformed.
        let end = rest.find(']')?;
        let host = &rest[..end];
        let tail = &rest[end + 1..];
        if !(tail.is_empty() || tail.starts_with(':')) {
            return None;
        }
        return (!host.is_empty()).then_some(host);
    }

    let host = match raw.find(':') {
        Some(idx) if raw[idx + 1..].contains(':') => raw,
        Some(idx) => &raw[..idx],
        None => raw,
    };
    (!host.is_empty()).then_some(host)
}

/// The routing key for a request, if it names a host at all.
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    requested_authority(req).and_then(normalize_host)
}
