//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use vhost_proxy::config::schema::{Config, Environment, LoggingConfig, ObservabilityConfig, ProxyConfig};
use vhost_proxy::lifecycle::{self, AppContext, RunningProxy, Shutdown};

const ECHO_HEADERS: &[&str] = &[
    "host",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-request-id",
    "connection",
    "te",
];

/// Start a backend that describes the request it received, one `key=value` per line.
///
/// `/status/<code>` answers with that status code.
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new().fallback(echo);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn echo(request: Request<Body>) -> (StatusCode, String) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let status = parts
        .uri
        .path()
        .strip_prefix("/status/")
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let mut out = format!("method={}\nuri={}\n", parts.method, parts.uri);
    for name in ECHO_HEADERS {
        if let Some(value) = parts.headers.get(*name).and_then(|v| v.to_str().ok()) {
            out.push_str(&format!("{name}={value}\n"));
        }
    }
    out.push_str(&format!("body={}\n", String::from_utf8_lossy(&body)));
    (status, out)
}

/// Value of `key` in an echo backend response.
pub fn echoed<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    body.lines()
        .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
}

/// Start a raw TCP backend that writes whatever `f` returns and closes.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let raw = f().await;
                        let _ = socket.write_all(raw.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Write a self-signed certificate for `hosts` into `dir`.
pub fn write_self_signed(dir: &Path, hosts: &[&str]) -> (PathBuf, PathBuf) {
    let names = hosts.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let rcgen::CertifiedKey { cert, key_pair } = rcgen::generate_simple_self_signed(names).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// Proxy config on ephemeral loopback ports with the given redirects.
pub fn proxy_config(redirects: &[(&str, String)]) -> ProxyConfig {
    let mut config = ProxyConfig::new("127.0.0.1", 0);
    for (host, url) in redirects {
        config.redirects.insert(host.to_string(), url.clone());
    }
    config
}

/// Build and start a proxy for `proxy_config`.
pub async fn start_proxy(proxy_config: ProxyConfig) -> RunningProxy {
    let config = Config {
        environment: Environment::Dev,
        logging: LoggingConfig::default(),
        proxy_config,
        observability: ObservabilityConfig::default(),
    };
    let ctx = AppContext::build(config).unwrap();
    lifecycle::start(&ctx, Shutdown::new()).await.unwrap()
}

/// HTTP client that resolves `hosts` to loopback and trusts any certificate.
pub fn client(hosts: &[&str]) -> reqwest::Client {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(10));
    for host in hosts {
        builder = builder.resolve(host, loopback);
    }
    builder.build().unwrap()
}
