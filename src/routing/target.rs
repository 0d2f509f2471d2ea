//! Proxy targets.
//!
//! A target is what a virtual host resolves to: either an upstream origin
//! the request is forwarded to, or a fixed response served locally.
//! Targets are built once at startup and never change.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode, Uri};
use bytes::Bytes;
use url::Url;

use crate::config::schema::StaticHostConfig;
use crate::config::validation::check_upstream_url;
use crate::routing::RouteError;

/// Where a virtual host's requests go.
#[derive(Debug, Clone)]
pub enum ProxyTarget {
    /// Forward to an upstream origin.
    Upstream(UpstreamTarget),
    /// Answer locally with a fixed response.
    Static(StaticResponse),
}

impl ProxyTarget {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyTarget::Upstream(_) => "upstream",
            ProxyTarget::Static(_) => "static",
        }
    }
}

/// An upstream base URL: scheme, authority, optional path prefix and query.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base: Url,
    scheme: String,
    authority: String,
}

impl UpstreamTarget {
    /// Parse and check an upstream base URL.
    pub fn parse(host: &str, raw: &str) -> Result<Self, RouteError> {
        let base = check_upstream_url(raw).map_err(|reason| RouteError::InvalidUpstream {
            host: host.to_string(),
            url: raw.to_string(),
            reason,
        })?;

        let host_part = match base.host() {
            Some(url::Host::Ipv6(addr)) => format!("[{addr}]"),
            Some(other) => other.to_string(),
            None => {
                return Err(RouteError::InvalidUpstream {
                    host: host.to_string(),
                    url: raw.to_string(),
                    reason: "missing host".to_string(),
                })
            }
        };
        let authority = match base.port() {
            Some(port) => format!("{host_part}:{port}"),
            None => host_part,
        };

        Ok(Self {
            scheme: base.scheme().to_string(),
            authority,
            base,
        })
    }

    /// `scheme://authority` of the upstream, for logs.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Rewrite an inbound request URI onto this upstream.
    ///
    /// The path is the base path joined with the request path by a single
    /// slash. Queries are concatenated with `&` when both are present.
    pub fn upstream_uri(&self, incoming: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(self.base.path(), incoming.path());

        let query = match (self.base.query().filter(|q| !q.is_empty()), incoming.query()) {
            (Some(base), Some(req)) if !req.is_empty() => Some(format!("{base}&{req}")),
            (Some(base), _) => Some(base.to_string()),
            (None, Some(req)) if !req.is_empty() => Some(req.to_string()),
            _ => None,
        };

        let path_and_query = match query {
            Some(q) => format!("{path}?{q}"),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// A fixed response served without contacting any upstream.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    status: StatusCode,
    content_type: HeaderValue,
    body: Bytes,
}

impl StaticResponse {
    pub fn new(status: StatusCode, content_type: HeaderValue, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Build from config, rejecting invalid status codes and content types.
    pub fn from_config(host: &str, config: &StaticHostConfig) -> Result<Self, RouteError> {
        let status = StatusCode::from_u16(config.status).map_err(|_| RouteError::InvalidStatic {
            host: host.to_string(),
            reason: format!("invalid status code {}", config.status),
        })?;
        let content_type =
            HeaderValue::from_str(&config.content_type).map_err(|_| RouteError::InvalidStatic {
                host: host.to_string(),
                reason: format!("invalid content type {:?}", config.content_type),
            })?;
        Ok(Self::new(status, content_type, config.body.clone()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// A fresh response carrying this target's status, type and body.
    pub fn to_response(&self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type.clone());
        response
    }
}
