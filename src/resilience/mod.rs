//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect deadline on the connector,
//!                    response deadline around the exchange)
//!     → On expiry: 502 Bad Gateway, cause logged
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries and no circuit breaking: a failed exchange fails the request

pub mod timeouts;

pub use timeouts::UpstreamTimeouts;
