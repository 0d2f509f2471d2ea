//! Timeout enforcement for upstream calls.
//!
//! # Responsibilities
//! - Carry connect, response and idle timeouts from config
//! - Apply the connect timeout to the connector
//! - Bound the wait for upstream response headers
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from transport errors in logs
//! - Both surface to the client as 502 Bad Gateway

use std::future::Future;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;

use crate::config::schema::ProxyConfig;

/// Deadlines applied to every upstream exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// TCP connect deadline.
    pub connect: Duration,
    /// Deadline from sending the request to receiving response headers.
    pub response: Duration,
    /// How long an idle pooled connection is kept.
    pub idle: Duration,
}

impl UpstreamTimeouts {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            connect: config.connect_timeout,
            response: config.default_timeout,
            idle: config.long_timeout,
        }
    }

    /// Install the connect deadline on a connector.
    pub fn apply(&self, connector: &mut HttpConnector) {
        connector.set_connect_timeout(Some(self.connect));
    }

    /// Run `fut` under the response deadline.
    pub async fn bound<F: Future>(&self, fut: F) -> Result<F::Output, Duration> {
        tokio::time::timeout(self.response, fut)
            .await
            .map_err(|_| self.response)
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::new("0.0.0.0", 0))
    }
}
