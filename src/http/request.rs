//! Per-request routing and logging context.
//!
//! # Responsibilities
//! - Capture host, path, method and arrival time once per request
//! - Carry the request ID assigned by the request-id layer
//! - Know which listener (plain or TLS) accepted the request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The context is read-only and dropped with the response

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, Method, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::net::listener::ListenerKind;
use crate::routing::host;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID `x-request-id` when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid)
}

/// Layer that echoes the request's `x-request-id` on the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID.clone())
}

/// What the dispatcher knows about a request before routing it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// Normalized routing key; `None` when the request named no host.
    pub host: Option<String>,
    /// Host as sent, port included.
    pub authority: Option<String>,
    pub path: String,
    pub method: Method,
    pub peer: Option<SocketAddr>,
    pub listener: ListenerKind,
    pub started: Instant,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>, listener: ListenerKind) -> Self {
        let request_id = req
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            request_id,
            host: host::request_host(req).map(str::to_string),
            authority: host::requested_authority(req).map(str::to_string),
            path: req.uri().path().to_string(),
            method: req.method().clone(),
            peer,
            listener,
            started: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_routing_fields() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/v1/items?page=2")
            .header("Host", "api.example.com:8080")
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("10.1.2.3:5555".parse::<SocketAddr>().unwrap()));

        let ctx = RequestContext::from_request(&req, ListenerKind::Tls);
        assert_eq!(ctx.request_id, "abc-123");
        assert_eq!(ctx.host.as_deref(), Some("api.example.com"));
        assert_eq!(ctx.authority.as_deref(), Some("api.example.com:8080"));
        assert_eq!(ctx.path, "/v1/items");
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.peer.map(|p| p.ip().to_string()).as_deref(), Some("10.1.2.3"));
        assert_eq!(ctx.listener, ListenerKind::Tls);
    }

    #[test]
    fn tolerates_missing_metadata() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let ctx = RequestContext::from_request(&req, ListenerKind::Plain);
        assert_eq!(ctx.request_id, "unknown");
        assert!(ctx.host.is_none());
        assert!(ctx.peer.is_none());
    }
}
