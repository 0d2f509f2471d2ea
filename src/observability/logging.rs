//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Console output: pretty in dev, JSON in prod
//! - Optional JSON log file with time-based rotation
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - File output goes through a non-blocking writer; the guard must outlive logging
//! - Weekly and monthly rotation roll daily and keep a proportionally longer history

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::schema::{Environment, FileOutputConfig, LoggingConfig, RotationPolicy};

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot create log directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps the background log writer alive. Drop it last.
#[derive(Debug, Default)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber for `config`.
pub fn init_logging(config: &LoggingConfig, environment: Environment) -> Result<LogGuard, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.level.as_directive()),
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(match environment {
        Environment::Dev => fmt::layer().pretty().boxed(),
        Environment::Prod => fmt::layer().json().boxed(),
    });

    let mut guard = LogGuard::default();
    let file_output = config
        .file_output
        .as_ref()
        .filter(|output| !output.file_path.as_os_str().is_empty());
    if let Some(output) = file_output {
        let appender = rolling_appender(output)?;
        let (writer, worker) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
        guard._file = Some(worker);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    if let Some(output) = file_output {
        if output.max_size_mb > 0 {
            tracing::warn!(
                max_size_mb = output.max_size_mb,
                "Size-based log rotation is not supported; rotating by time only"
            );
        }
        tracing::info!(
            file = %output.file_path.display(),
            rotation = %output.rotation_policy,
            max_backups = output.max_backups,
            "File logging enabled"
        );
    }

    Ok(guard)
}

/// Cadence and retained file count for a rotation policy.
pub fn rotation_plan(policy: RotationPolicy, max_backups: usize) -> (Rotation, usize) {
    let keep = max_backups.max(1);
    match policy {
        RotationPolicy::Daily => (Rotation::DAILY, keep),
        RotationPolicy::Weekly => (Rotation::DAILY, keep * 7),
        RotationPolicy::Monthly => (Rotation::DAILY, keep * 31),
    }
}

/// Build the rolling appender for `output.file_path`.
///
/// `/var/log/proxy/proxy.log` becomes `proxy.<date>.log` files in `/var/log/proxy`.
pub fn rolling_appender(output: &FileOutputConfig) -> Result<RollingFileAppender, LoggingError> {
    let path = output.file_path.as_path();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("proxy");
    let (rotation, max_files) = rotation_plan(output.rotation_policy, output.max_backups);

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .max_log_files(max_files);
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        builder = builder.filename_suffix(ext);
    }
    Ok(builder.build(dir)?)
}
