//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → AppContext (routes, client) → bind all listeners → serve
//!
//! Supervision (startup.rs):
//!     first listener exit → stop the others → error
//!     shutdown signal     → drain (10s)     → Ok
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (shutdown.rs)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routes, then listeners
//! - Listeners start last (traffic only when ready)
//! - Shutdown has a deadline: in-flight requests are cut after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{start, AppContext, LifecycleError, RunningProxy};
