//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched upstream request:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Forward to upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → Stream to client
//! ```
//!
//! # Design Decisions
//! - Hop-by-hop headers never cross the proxy in either direction
//! - No trust in client input: forwarding headers are appended, not replaced

pub mod headers;
