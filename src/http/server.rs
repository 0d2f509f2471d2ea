//! The routing dispatcher.
//!
//! # Responsibilities
//! - Create the Axum Router shared by both listeners
//! - Wire up middleware (request ID, tracing)
//! - Resolve each request's virtual host to a target
//! - Forward to upstreams, serve static targets, or answer 404
//! - Turn upstream transport failures into a fixed 502

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{header, HeaderValue, Request, Response, StatusCode, Version},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::schema::ProxyConfig;
use crate::http::client::{ForwardError, UpstreamClient};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestContext};
use crate::http::response::{self, with_access_log, AccessRecord, Outcome};
use crate::net::listener::ListenerKind;
use crate::resilience::UpstreamTimeouts;
use crate::routing::{ProxyTarget, RouteError, RouteTable, UpstreamTarget};
use crate::security::headers::{add_forwarded_headers, strip_hop_by_hop};

/// Routing dispatcher shared by every listener.
///
/// Cheap to clone; all clones share one route table and one upstream client.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Debug)]
struct DispatcherInner {
    routes: RouteTable,
    client: UpstreamClient,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, client: UpstreamClient) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { routes, client }),
        }
    }

    /// Compile the route table and build the upstream client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RouteError> {
        let routes = RouteTable::from_config(config)?;
        let client = UpstreamClient::new(UpstreamTimeouts::from_config(config));
        Ok(Self::new(routes, client))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// Build the Axum router for one listener.
    pub fn router(&self, listener: ListenerKind) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(self.clone())
            .layer(Extension(listener))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Route one request and produce the response the client will see.
    pub async fn dispatch(&self, request: Request<Body>, listener: ListenerKind) -> Response<Body> {
        let ctx = RequestContext::from_request(&request, listener);

        tracing::debug!(
            request_id = %ctx.request_id,
            host = ctx.host.as_deref().unwrap_or("-"),
            path = %ctx.path,
            method = %ctx.method,
            "Request received"
        );

        let target = ctx
            .host
            .as_deref()
            .and_then(|host| self.inner.routes.lookup(host))
            .cloned();

        let Some(target) = target else {
            let response = response::not_found();
            let record = AccessRecord::new(&ctx, response.status(), Outcome::NotFound);
            return with_access_log(response, record);
        };

        match target.as_ref() {
            ProxyTarget::Static(fixed) => {
                let record = AccessRecord::new(&ctx, fixed.status(), Outcome::Static);
                with_access_log(fixed.to_response(), record)
            }
            ProxyTarget::Upstream(upstream) => match self.forward(upstream, request, &ctx).await {
                Ok(response) => {
                    let record = AccessRecord::new(&ctx, response.status(), Outcome::Proxied)
                        .with_upstream(upstream.origin());
                    with_access_log(response, record)
                }
                Err(err) => {
                    let record = AccessRecord::new(&ctx, StatusCode::BAD_GATEWAY, Outcome::Error)
                        .with_upstream(upstream.origin())
                        .with_cause(format!("{}: {}", err.kind(), err.cause_chain()));
                    with_access_log(response::bad_gateway(), record)
                }
            },
        }
    }

    async fn forward(
        &self,
        upstream: &UpstreamTarget,
        request: Request<Body>,
        ctx: &RequestContext,
    ) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        // HTTP/2 clients send :authority instead of Host; keep what they asked for.
        if !parts.headers.contains_key(header::HOST) {
            if let Some(value) = ctx
                .authority
                .as_deref()
                .and_then(|a| HeaderValue::from_str(a).ok())
            {
                parts.headers.insert(header::HOST, value);
            }
        }
        add_forwarded_headers(
            &mut parts.headers,
            ctx.peer.map(|addr| addr.ip()),
            ctx.authority.as_deref(),
            ctx.listener.scheme(),
        );

        let response = self
            .inner
            .client
            .send(Request::from_parts(parts, body))
            .await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

async fn dispatch_handler(
    State(dispatcher): State<Dispatcher>,
    Extension(listener): Extension<ListenerKind>,
    request: Request<Body>,
) -> Response<Body> {
    dispatcher.dispatch(request, listener).await
}
