//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one access entry per request)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty in dev, JSON in prod)
//!     → rolling log file (JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every log entry of a request
//! - Metrics are cheap; recording is a no-op without an installed recorder

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogGuard, LoggingError};
