//! Startup orchestration and listener supervision.
//!
//! # Responsibilities
//! - Build the application context (route table, upstream client) from config
//! - Bind every listener before any of them serves
//! - Supervise the listeners until shutdown or the first listener exit
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Both listeners are equally fatal; when one exits the other is stopped
//! - Shutdown drains in-flight requests for a bounded time

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::config::schema::Config;
use crate::http::server::Dispatcher;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::listener::{BoundListener, ListenerError, ListenerKind, ListenerSpec, ListenerState};
use crate::routing::RouteError;

/// How long in-flight requests may run after shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for startup and supervision.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("route table: {0}")]
    Route(#[from] RouteError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("{0} listener stopped unexpectedly")]
    ListenerStopped(ListenerKind),

    #[error("listener task panicked: {0}")]
    Task(#[from] JoinError),
}

/// Everything a running proxy shares: the loaded config and the dispatcher.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<Config>,
    dispatcher: Dispatcher,
}

impl AppContext {
    pub fn build(config: Config) -> Result<Self, LifecycleError> {
        let dispatcher = Dispatcher::from_config(&config.proxy_config)?;
        Ok(Self {
            config: Arc::new(config),
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

type ListenerTask = Result<ListenerKind, ListenerError>;

/// Handle to the serving listeners.
#[derive(Debug)]
pub struct RunningProxy {
    listeners: Vec<(ListenerKind, SocketAddr, watch::Receiver<ListenerState>)>,
    shutdown: Shutdown,
    supervisor: JoinHandle<Result<(), LifecycleError>>,
}

impl RunningProxy {
    fn addr(&self, kind: ListenerKind) -> Option<SocketAddr> {
        self.listeners
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|(_, addr, _)| *addr)
    }

    /// Bound address of the plaintext listener.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.addr(ListenerKind::Plain)
    }

    /// Bound address of the TLS listener, when TLS is enabled.
    pub fn https_addr(&self) -> Option<SocketAddr> {
        self.addr(ListenerKind::Tls)
    }

    /// Current state of a listener; `None` if it was never configured.
    pub fn state(&self, kind: ListenerKind) -> Option<ListenerState> {
        self.listeners
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|(_, _, state)| *state.borrow())
    }

    /// Start a graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the supervisor. `Ok` only after a requested shutdown.
    pub async fn wait(self) -> Result<(), LifecycleError> {
        self.supervisor.await?
    }
}

/// Bind every configured listener, then serve them all.
pub async fn start(ctx: &AppContext, shutdown: Shutdown) -> Result<RunningProxy, LifecycleError> {
    let specs = ListenerSpec::from_config(&ctx.config.proxy_config)?;
    if ctx.dispatcher.routes().is_empty() {
        tracing::warn!("No hosts configured; every request will get 404");
    }

    let mut bound = Vec::with_capacity(specs.len());
    for spec in specs {
        bound.push(BoundListener::bind(spec).await?);
    }

    let shutdown_rx = shutdown.subscribe();
    let mut listeners = Vec::with_capacity(bound.len());
    let mut handles = Vec::with_capacity(bound.len());
    let mut tasks = JoinSet::new();

    for listener in bound {
        let kind = listener.kind();
        listeners.push((kind, listener.local_addr(), listener.state()));

        let handle = Handle::new();
        handles.push(handle.clone());
        tasks.spawn(listener.serve(ctx.dispatcher.router(kind), handle));
    }

    tracing::info!(
        environment = %ctx.config.environment,
        listeners = listeners.len(),
        routes = ctx.dispatcher.routes().len(),
        "Proxy started"
    );

    let supervisor = tokio::spawn(supervise(tasks, handles, shutdown_rx));
    Ok(RunningProxy {
        listeners,
        shutdown,
        supervisor,
    })
}

async fn supervise(
    mut tasks: JoinSet<ListenerTask>,
    handles: Vec<Handle>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), LifecycleError> {
    let first = tokio::select! {
        _ = shutdown.recv() => None,
        Some(joined) = tasks.join_next() => Some(joined),
    };

    let outcome = match first {
        None => {
            tracing::info!(drain_secs = DRAIN_TIMEOUT.as_secs(), "Draining listeners");
            Ok(())
        }
        Some(Ok(Ok(kind))) => Err(LifecycleError::ListenerStopped(kind)),
        Some(Ok(Err(err))) => Err(err.into()),
        Some(Err(err)) => Err(err.into()),
    };
    if let Err(err) = &outcome {
        tracing::error!(error = %err, "Listener exited; stopping the rest");
    }

    for handle in &handles {
        handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
    }
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "Listener failed during shutdown"),
            Err(err) => tracing::warn!(error = %err, "Listener task failed during shutdown"),
        }
    }

    tracing::info!("Shutdown complete");
    outcome
}
