//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Keys are camelCase in the YAML file. Enumerated values (environment, log
//! level, rotation policy) and durations are checked while deserializing, so
//! a bad value fails loading before anything else runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Root configuration for the proxy process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Deployment environment; selects the console log format.
    pub environment: Environment,

    /// Logging sink settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Listener ports, TLS material and the host routing table.
    pub proxy_config: ProxyConfig,

    /// Metrics exposition.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

/// Minimum severity written by the logging sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }

    /// The `EnvFilter` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPolicy {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl RotationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationPolicy::Daily => "daily",
            RotationPolicy::Weekly => "weekly",
            RotationPolicy::Monthly => "monthly",
        }
    }
}

impl FromStr for RotationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RotationPolicy::Daily),
            "weekly" => Ok(RotationPolicy::Weekly),
            "monthly" => Ok(RotationPolicy::Monthly),
            other => Err(format!("invalid rotation policy: {other}")),
        }
    }
}

macro_rules! string_enum_serde {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(serde::de::Error::custom)
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

string_enum_serde!(Environment, LogLevel, RotationPolicy);

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level (debug, info, warning, error).
    pub level: LogLevel,

    /// Optional file sink. Console only when absent.
    pub file_output: Option<FileOutputConfig>,
}

/// Rolling log file settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutputConfig {
    /// Log file path. An empty path disables the file sink.
    #[serde(default)]
    pub file_path: PathBuf,

    #[serde(default)]
    pub rotation_policy: RotationPolicy,

    /// Size threshold in megabytes.
    #[serde(default, rename = "maxSizeMB")]
    pub max_size_mb: u64,

    /// Number of rotated files to keep.
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_max_backups() -> usize {
    7
}

/// Listener and routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Interface both listeners bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Plaintext listener port.
    pub http_port: u16,

    /// TLS listener port. The TLS listener is disabled when absent.
    #[serde(default)]
    pub https_port: Option<u16>,

    /// PEM certificate chain for the TLS listener.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    /// PEM private key for the TLS listener.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Upstream connection establishment timeout.
    #[serde(default = "default_connect_timeout", with = "duration_str")]
    pub connect_timeout: Duration,

    /// Deadline for the upstream to produce response headers.
    #[serde(default = "default_timeout", with = "duration_str")]
    pub default_timeout: Duration,

    /// How long idle upstream connections stay pooled.
    #[serde(default = "default_long_timeout", with = "duration_str")]
    pub long_timeout: Duration,

    /// Virtual host to upstream base URL.
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,

    /// Virtual host served locally with a fixed response.
    #[serde(default)]
    pub static_hosts: BTreeMap<String, StaticHostConfig>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_long_timeout() -> Duration {
    Duration::from_secs(90)
}

impl ProxyConfig {
    /// A config with no routes listening on `bind_address`, defaults elsewhere.
    pub fn new(bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            http_port,
            https_port: None,
            cert_file: None,
            key_file: None,
            connect_timeout: default_connect_timeout(),
            default_timeout: default_timeout(),
            long_timeout: default_long_timeout(),
            redirects: BTreeMap::new(),
            static_hosts: BTreeMap::new(),
        }
    }

    /// True when a TLS listener is configured.
    pub fn tls_enabled(&self) -> bool {
        self.https_port.is_some()
    }
}

/// A locally served response for one virtual host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticHostConfig {
    #[serde(default = "default_static_status")]
    pub status: u16,

    #[serde(default)]
    pub body: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_static_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Human-readable durations ("5s", "1m 30s", "250ms").
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {raw:?}: {e}")))
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }
}
