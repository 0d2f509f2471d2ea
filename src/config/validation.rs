//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream URLs are absolute http/https URLs
//! - TLS listener has both certificate and key on disk
//! - Validate value ranges (timeouts > 0, distinct ports)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function over the parsed config (plus file existence)
//! - Runs before config is accepted into the system

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::schema::{Config, ProxyConfig};

/// A single semantic problem in a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("hostname {0:?} must be non-empty and contain no port or whitespace")]
    InvalidHostname(String),

    #[error("redirect for {host:?} has invalid upstream URL {url:?}: {reason}")]
    InvalidUpstreamUrl {
        host: String,
        url: String,
        reason: String,
    },

    #[error("host {0:?} is configured both as a redirect and as a static host")]
    DuplicateHost(String),

    #[error("static host {host:?} has invalid status code {status}")]
    InvalidStatus { host: String, status: u16 },

    #[error("static host {host:?} has invalid content type {content_type:?}")]
    InvalidContentType { host: String, content_type: String },

    #[error("httpsPort is set but {0} is missing")]
    MissingTlsMaterial(&'static str),

    #[error("{field} file not found: {}", .path.display())]
    TlsFileNotFound { field: &'static str, path: PathBuf },

    #[error("certFile/keyFile are set but httpsPort is not")]
    TlsWithoutPort,

    #[error("httpPort and httpsPort must differ (both are {0})")]
    PortConflict(u16),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Validate the whole configuration, collecting every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_proxy(&config.proxy_config, &mut errors);

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_proxy(proxy: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if proxy.bind_address.parse::<std::net::IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(proxy.bind_address.clone()));
    }

    for (host, url) in &proxy.redirects {
        if !is_valid_hostname(host) {
            errors.push(ValidationError::InvalidHostname(host.clone()));
        }
        if let Err(reason) = check_upstream_url(url) {
            errors.push(ValidationError::InvalidUpstreamUrl {
                host: host.clone(),
                url: url.clone(),
                reason,
            });
        }
    }

    for (host, response) in &proxy.static_hosts {
        if !is_valid_hostname(host) {
            errors.push(ValidationError::InvalidHostname(host.clone()));
        }
        if proxy.redirects.contains_key(host) {
            errors.push(ValidationError::DuplicateHost(host.clone()));
        }
        if StatusCode::from_u16(response.status).is_err() {
            errors.push(ValidationError::InvalidStatus {
                host: host.clone(),
                status: response.status,
            });
        }
        if axum::http::HeaderValue::from_str(&response.content_type).is_err() {
            errors.push(ValidationError::InvalidContentType {
                host: host.clone(),
                content_type: response.content_type.clone(),
            });
        }
    }

    match proxy.https_port {
        Some(https_port) => {
            check_tls_file("certFile", proxy.cert_file.as_ref(), errors);
            check_tls_file("keyFile", proxy.key_file.as_ref(), errors);
            if https_port == proxy.http_port && https_port != 0 {
                errors.push(ValidationError::PortConflict(https_port));
            }
        }
        None => {
            if proxy.cert_file.is_some() || proxy.key_file.is_some() {
                errors.push(ValidationError::TlsWithoutPort);
            }
        }
    }

    for (name, value) in [
        ("connectTimeout", proxy.connect_timeout),
        ("defaultTimeout", proxy.default_timeout),
        ("longTimeout", proxy.long_timeout),
    ] {
        if value == Duration::ZERO {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
}

fn check_tls_file(field: &'static str, path: Option<&PathBuf>, errors: &mut Vec<ValidationError>) {
    match path {
        None => errors.push(ValidationError::MissingTlsMaterial(field)),
        Some(p) if p.as_os_str().is_empty() => errors.push(ValidationError::MissingTlsMaterial(field)),
        Some(p) if !p.is_file() => errors.push(ValidationError::TlsFileNotFound {
            field,
            path: p.clone(),
        }),
        Some(_) => {}
    }
}

/// Route table keys are bare hostnames: no port, no whitespace.
/// Bracketed IPv6 literals are not valid keys; use the bare address.
pub fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.chars().any(|c| c.is_whitespace() || c == '/') {
        return false;
    }
    if host.starts_with('[') || host.ends_with(']') {
        return false;
    }
    // A single colon means a port suffix; several means an IPv6 literal.
    host.matches(':').count() != 1
}

/// Check that an upstream base URL is usable as a forwarding target.
pub fn check_upstream_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err("missing host".to_string());
    }
    if url.fragment().is_some() {
        return Err("fragments are not allowed".to_string());
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err("credentials are not allowed".to_string());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Environment, LoggingConfig, ObservabilityConfig, StaticHostConfig};

    fn config_with(proxy: ProxyConfig) -> Config {
        Config {
            environment: Environment::Dev,
            logging: LoggingConfig::default(),
            proxy_config: proxy,
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn accepts_plain_redirects() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.redirects.insert("api.example.com".into(), "http://127.0.0.1:9001".into());
        proxy.redirects.insert("app.example.com".into(), "https://backend.internal/app/".into());
        assert!(validate_config(&config_with(proxy)).is_ok());
    }

    #[test]
    fn reports_every_bad_redirect() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.redirects.insert("a.example.com".into(), "not a url".into());
        proxy.redirects.insert("b.example.com".into(), "ftp://files.example.com".into());
        proxy.redirects.insert("c.example.com:8080".into(), "http://127.0.0.1:1".into());

        let errors = validate_config(&config_with(proxy)).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidHostname(h) if h == "c.example.com:8080")));
    }

    #[test]
    fn https_port_requires_existing_material() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.https_port = Some(8443);
        proxy.cert_file = Some("/definitely/not/here/cert.pem".into());

        let errors = validate_config(&config_with(proxy)).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingTlsMaterial("keyFile")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::TlsFileNotFound { field: "certFile", .. })));
    }

    #[test]
    fn tls_material_without_port_is_rejected() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.key_file = Some("key.pem".into());
        let errors = validate_config(&config_with(proxy)).unwrap_err();
        assert_eq!(errors, vec![ValidationError::TlsWithoutPort]);
    }

    #[test]
    fn static_host_conflicts_and_bad_status() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.redirects.insert("dup.example.com".into(), "http://127.0.0.1:9001".into());
        proxy.static_hosts.insert(
            "dup.example.com".into(),
            StaticHostConfig {
                status: 42,
                body: String::new(),
                content_type: "text/plain".into(),
            },
        );

        let errors = validate_config(&config_with(proxy)).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateHost("dup.example.com".into())));
        assert!(errors.contains(&ValidationError::InvalidStatus {
            host: "dup.example.com".into(),
            status: 42
        }));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut proxy = ProxyConfig::new("127.0.0.1", 8080);
        proxy.default_timeout = Duration::ZERO;
        let errors = validate_config(&config_with(proxy)).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroTimeout("defaultTimeout")]);
    }

    #[test]
    fn hostname_rules() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("localhost"));
        assert!(is_valid_hostname("::1"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("example.com:80"));
        assert!(!is_valid_hostname("[::1]"));
        assert!(!is_valid_hostname("bad host"));
    }

    #[test]
    fn upstream_url_rules() {
        assert!(check_upstream_url("http://127.0.0.1:9001").is_ok());
        assert!(check_upstream_url("https://api.internal/base?x=1").is_ok());
        assert!(check_upstream_url("http://127.0.0.1/#frag").is_err());
        assert!(check_upstream_url("http://user:pw@127.0.0.1").is_err());
        assert!(check_upstream_url("/relative/only").is_err());
    }
}
