//! Host-based HTTP/HTTPS reverse proxy.
//!
//! Requests are routed by their `Host` header: mapped hosts are forwarded
//! to an upstream URL or answered from a static target, everything else
//! gets a 404. A plaintext and an optional TLS listener share one routing
//! table.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::{Config, ProxyConfig};
pub use http::Dispatcher;
pub use lifecycle::{AppContext, RunningProxy, Shutdown};
