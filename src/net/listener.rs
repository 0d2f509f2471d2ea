//! Plaintext and TLS listeners.
//!
//! # Responsibilities
//! - Derive listener specs (address, optional TLS material) from config
//! - Bind sockets and load TLS material before anything serves
//! - Serve an axum router on a bound socket until stopped
//! - Publish each listener's state
//!
//! # Design Decisions
//! - Binding is separate from serving so every bind error is a startup error
//! - TLS material is read once, at bind time
//! - State moves NotStarted → Starting → Serving → (Failed | Stopped)

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::schema::ProxyConfig;
use crate::net::tls::load_tls_config;

/// Which of the two listeners accepted a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Plain,
    Tls,
}

impl ListenerKind {
    /// URL scheme clients used to reach this listener.
    pub fn scheme(&self) -> &'static str {
        match self {
            ListenerKind::Plain => "http",
            ListenerKind::Tls => "https",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Listener lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    NotStarted,
    Starting,
    Serving,
    Failed,
    Stopped,
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address {0:?}")]
    Address(String),

    #[error("{kind} listener failed to bind {addr}: {source}")]
    Bind {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} listener could not load TLS material: {source}")]
    Tls {
        kind: ListenerKind,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} listener failed: {source}")]
    Serve {
        kind: ListenerKind,
        #[source]
        source: std::io::Error,
    },
}

/// Certificate chain and private key, both PEM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Where and how one listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSpec {
    pub kind: ListenerKind,
    pub addr: SocketAddr,
    pub tls: Option<TlsMaterial>,
}

impl ListenerSpec {
    /// The plaintext listener, plus the TLS listener when a port and
    /// both halves of the key pair are configured.
    pub fn from_config(config: &ProxyConfig) -> Result<Vec<ListenerSpec>, ListenerError> {
        let ip: IpAddr = config
            .bind_address
            .parse()
            .map_err(|_| ListenerError::Address(config.bind_address.clone()))?;

        let mut specs = vec![ListenerSpec {
            kind: ListenerKind::Plain,
            addr: SocketAddr::new(ip, config.http_port),
            tls: None,
        }];

        match (config.https_port, &config.cert_file, &config.key_file) {
            (Some(port), Some(cert), Some(key)) => specs.push(ListenerSpec {
                kind: ListenerKind::Tls,
                addr: SocketAddr::new(ip, port),
                tls: Some(TlsMaterial {
                    cert_path: cert.clone(),
                    key_path: key.clone(),
                }),
            }),
            (Some(port), _, _) => {
                tracing::warn!(port, "TLS listener not started: certFile and keyFile are both required");
            }
            _ => {}
        }

        Ok(specs)
    }
}

/// A bound socket, ready to serve.
pub struct BoundListener {
    kind: ListenerKind,
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    tls: Option<RustlsConfig>,
    state: Arc<watch::Sender<ListenerState>>,
}

impl BoundListener {
    /// Load TLS material (if any) and bind the socket.
    pub async fn bind(spec: ListenerSpec) -> Result<Self, ListenerError> {
        let kind = spec.kind;
        let (state, _) = watch::channel(ListenerState::NotStarted);
        state.send_replace(ListenerState::Starting);

        let tls = match &spec.tls {
            Some(material) => Some(
                load_tls_config(&material.cert_path, &material.key_path)
                    .await
                    .map_err(|source| ListenerError::Tls { kind, source })?,
            ),
            None => None,
        };

        let bind_err = |source| ListenerError::Bind {
            kind,
            addr: spec.addr,
            source,
        };
        let listener = TcpListener::bind(spec.addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        let listener = listener.into_std().map_err(bind_err)?;

        tracing::info!(listener = %kind, address = %local_addr, "Listener bound");

        Ok(Self {
            kind,
            listener,
            local_addr,
            tls,
            state: Arc::new(state),
        })
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Observe this listener's state.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Serve `app` until `handle` shuts the listener down or it fails.
    pub async fn serve(self, app: Router, handle: Handle) -> Result<ListenerKind, ListenerError> {
        let kind = self.kind;
        let state = self.state;
        let make_service = app.into_make_service_with_connect_info::<SocketAddr>();

        let serving = {
            let handle = handle.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                if let Some(addr) = handle.listening().await {
                    state.send_replace(ListenerState::Serving);
                    tracing::info!(listener = %kind, address = %addr, "Listener serving");
                }
            })
        };

        let result = match self.tls {
            Some(tls) => {
                axum_server::from_tcp_rustls(self.listener, tls)
                    .handle(handle)
                    .serve(make_service)
                    .await
            }
            None => {
                axum_server::from_tcp(self.listener)
                    .handle(handle)
                    .serve(make_service)
                    .await
            }
        };
        serving.abort();

        match result {
            Ok(()) => {
                state.send_replace(ListenerState::Stopped);
                tracing::info!(listener = %kind, "Listener stopped");
                Ok(kind)
            }
            Err(source) => {
                state.send_replace(ListenerState::Failed);
                tracing::error!(listener = %kind, error = %source, "Listener failed");
                Err(ListenerError::Serve { kind, source })
            }
        }
    }
}

impl fmt::Debug for BoundListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundListener")
            .field("kind", &self.kind)
            .field("local_addr", &self.local_addr)
            .field("tls", &self.tls.is_some())
            .field("state", &*self.state.borrow())
            .finish()
    }
}
