//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → host.rs (strip port, unwrap IPv6 brackets)
//!     → router.rs (exact host lookup)
//!     → Return: ProxyTarget (upstream or static) or NoMatch
//!
//! Route Compilation (at startup):
//!     redirects + staticHosts
//!     → target.rs (parse upstream URLs, build static responses)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Hosts are matched exactly; no wildcards, no case folding
//! - Deterministic: same config always yields the same table

use thiserror::Error;

pub mod host;
pub mod router;
pub mod target;

pub use host::{normalize_host, request_host};
pub use router::RouteTable;
pub use target::{ProxyTarget, StaticResponse, UpstreamTarget};

/// Error type for route compilation.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid upstream URL {url:?} for host {host:?}: {reason}")]
    InvalidUpstream {
        host: String,
        url: String,
        reason: String,
    },

    #[error("invalid static response for host {host:?}: {reason}")]
    InvalidStatic { host: String, reason: String },

    #[error("host {0:?} is routed more than once")]
    DuplicateHost(String),
}
