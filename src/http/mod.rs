//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (plain or TLS)
//!     → request.rs (request ID, RequestContext)
//!     → server.rs (dispatcher: host lookup)
//!     → client.rs (forward to upstream) | static target | 404
//!     → response.rs (fixed bodies, access log on body completion)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{ForwardError, UpstreamClient};
pub use request::{RequestContext, X_REQUEST_ID};
pub use response::{AccessRecord, Outcome};
pub use server::Dispatcher;
