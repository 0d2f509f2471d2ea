//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig
//!     → listener.rs (ListenerSpec per protocol, bind)
//!     → tls.rs (load PEM material for the TLS listener)
//!     → listener.rs (serve the shared dispatcher router)
//!     → Hand off to HTTP layer
//!
//! Listener States:
//!     NotStarted → Starting → Serving → (Failed | Stopped)
//! ```
//!
//! # Design Decisions
//! - Both listeners serve routers built from the same dispatcher
//! - TLS is optional; it is only started with a port, a cert and a key

pub mod listener;
pub mod tls;

pub use listener::{BoundListener, ListenerError, ListenerKind, ListenerSpec, ListenerState};
