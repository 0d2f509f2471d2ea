//! Upstream HTTP client.
//!
//! One pooled hyper client is shared by every listener and every host.
//! It speaks HTTP/1.1 to upstreams over plain TCP or rustls.

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::net::tls::install_crypto_provider;
use crate::resilience::UpstreamTimeouts;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// A failed upstream exchange. Never shown to clients.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream transport error: {0}")]
    Transport(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Coarse failure class for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Request(_) => "request",
            ForwardError::Transport(e) if e.is_connect() => "connect",
            ForwardError::Transport(_) => "transport",
            ForwardError::Timeout(_) => "timeout",
        }
    }

    /// The error and all of its sources, joined with `: `.
    pub fn cause_chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

/// Shared forwarding client with connect, response and idle deadlines.
#[derive(Clone)]
pub struct UpstreamClient {
    client: HttpsClient,
    timeouts: UpstreamTimeouts,
}

impl UpstreamClient {
    pub fn new(timeouts: UpstreamTimeouts) -> Self {
        install_crypto_provider();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        timeouts.apply(&mut http);

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(timeouts.idle)
            .build(https);

        tracing::debug!(
            connect_timeout = ?timeouts.connect,
            response_timeout = ?timeouts.response,
            idle_timeout = ?timeouts.idle,
            "Upstream client configured"
        );

        Self { client, timeouts }
    }

    /// Send a fully rewritten request and wait for the response headers.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, ForwardError> {
        match self.timeouts.bound(self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ForwardError::Transport(e)),
            Err(deadline) => Err(ForwardError::Timeout(deadline)),
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
