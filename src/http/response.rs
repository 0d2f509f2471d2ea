//! Response construction and the per-request access log.
//!
//! # Responsibilities
//! - Build the fixed local responses (404, 502)
//! - Emit one access log entry per request once the body is written
//! - Record request metrics at the same point
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body; the log entry is tied
//!   to the body's lifetime so the duration covers the last byte written
//! - Transport failures never reach the client; only a fixed body does

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Response, StatusCode};
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::http::request::RequestContext;
use crate::net::listener::ListenerKind;
use crate::observability::metrics;

pub const NOT_FOUND_BODY: &str = "404 page not found\n";
pub const BAD_GATEWAY_BODY: &str = "502 bad gateway\n";

/// How the dispatcher resolved a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Proxied,
    Static,
    NotFound,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Proxied => "proxied",
            Outcome::Static => "static",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn plain_text(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// Response for hosts with no route.
pub fn not_found() -> Response<Body> {
    plain_text(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Response for any failed upstream exchange.
pub fn bad_gateway() -> Response<Body> {
    plain_text(StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY)
}

/// Everything the access log needs about one finished request.
#[derive(Debug)]
pub struct AccessRecord {
    request_id: String,
    host: Option<String>,
    path: String,
    method: Method,
    listener: ListenerKind,
    started: Instant,
    status: StatusCode,
    outcome: Outcome,
    upstream: Option<String>,
    cause: Option<String>,
}

impl AccessRecord {
    pub fn new(ctx: &RequestContext, status: StatusCode, outcome: Outcome) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            host: ctx.host.clone(),
            path: ctx.path.clone(),
            method: ctx.method.clone(),
            listener: ctx.listener,
            started: ctx.started,
            status,
            outcome,
            upstream: None,
            cause: None,
        }
    }

    pub fn with_upstream(mut self, origin: String) -> Self {
        self.upstream = Some(origin);
        self
    }

    /// Attach the underlying failure; the entry is then logged at error level.
    pub fn with_cause(mut self, cause: String) -> Self {
        self.cause = Some(cause);
        self
    }

    fn emit(&self, completed: bool) {
        let elapsed = self.started.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let host = self.host.as_deref().unwrap_or("-");
        let upstream = self.upstream.as_deref().unwrap_or("-");

        match &self.cause {
            Some(cause) => tracing::error!(
                request_id = %self.request_id,
                host = %host,
                path = %self.path,
                method = %self.method,
                listener = %self.listener,
                upstream = %upstream,
                status_code = self.status.as_u16(),
                outcome = %self.outcome,
                duration_ms,
                completed,
                cause = %cause,
                "Proxy error"
            ),
            None => tracing::info!(
                request_id = %self.request_id,
                host = %host,
                path = %self.path,
                method = %self.method,
                listener = %self.listener,
                upstream = %upstream,
                status_code = self.status.as_u16(),
                outcome = %self.outcome,
                duration_ms,
                completed,
                "Request completed"
            ),
        }

        metrics::record_request(
            self.method.as_str(),
            self.status.as_u16(),
            self.outcome.as_str(),
            elapsed,
        );
    }
}

/// Response body wrapper that logs the request when the body ends or is dropped.
pub struct AccessLogBody {
    inner: Body,
    record: Option<AccessRecord>,
}

impl AccessLogBody {
    pub fn new(inner: Body, record: AccessRecord) -> Self {
        Self {
            inner,
            record: Some(record),
        }
    }

    fn finish(&mut self, completed: bool) {
        if let Some(record) = self.record.take() {
            record.emit(completed);
        }
    }
}

impl HttpBody for AccessLogBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_frame(cx);
        match &poll {
            Poll::Ready(None) => this.finish(true),
            Poll::Ready(Some(Err(_))) => this.finish(false),
            _ => {}
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for AccessLogBody {
    fn drop(&mut self) {
        // Empty bodies are never polled; ending at end-of-stream still counts.
        let completed = self.inner.is_end_stream();
        self.finish(completed);
    }
}

/// Attach the access log to a response.
pub fn with_access_log(response: Response<Body>, record: AccessRecord) -> Response<Body> {
    response.map(|body| Body::new(AccessLogBody::new(body, record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn fixed_responses_have_generic_bodies() {
        let nf = not_found();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        let body = nf.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, NOT_FOUND_BODY);

        let bg = bad_gateway();
        assert_eq!(bg.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(bg.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        let body = bg.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, BAD_GATEWAY_BODY);
    }

    #[tokio::test]
    async fn access_log_body_passes_data_through() {
        let req = Request::builder()
            .uri("/x")
            .header("Host", "a.example.com")
            .body(())
            .unwrap();
        let ctx = RequestContext::from_request(&req, ListenerKind::Plain);
        let record = AccessRecord::new(&ctx, StatusCode::OK, Outcome::Static);

        let response = with_access_log(Response::new(Body::from("hello")), record);
        assert_eq!(
            HttpBody::size_hint(response.body()).exact(),
            Some(5)
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "hello");
    }
}
