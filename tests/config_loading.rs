//! Loading configuration files from disk.

use std::time::Duration;

use vhost_proxy::config::{load_config, ConfigError, Environment, LogLevel, RotationPolicy, ValidationError};

mod common;

fn write(dir: &std::path::Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn full_config_with_environment_expansion() {
    let dir = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_self_signed(dir.path(), &["localhost"]);
    std::env::set_var("VHOST_TEST_UPSTREAM_PORT", "9001");

    let yaml = format!(
        r#"
environment: prod
logging:
  level: WARNING
  fileOutput:
    filePath: {log}
    rotationPolicy: weekly
    maxSizeMB: 10
proxyConfig:
  httpPort: 8080
  httpsPort: 8443
  certFile: {cert}
  keyFile: {key}
  defaultTimeout: 2s
  redirects:
    api.example.com: http://127.0.0.1:${{VHOST_TEST_UPSTREAM_PORT}}/v1
  staticHosts:
    status.example.com:
      body: ok
"#,
        log = dir.path().join("proxy.log").display(),
        cert = cert.display(),
        key = key.display(),
    );
    let config = load_config(&write(dir.path(), &yaml)).unwrap();

    assert_eq!(config.environment, Environment::Prod);
    assert_eq!(config.logging.level, LogLevel::Warning);
    let file = config.logging.file_output.unwrap();
    assert_eq!(file.rotation_policy, RotationPolicy::Weekly);
    assert_eq!(file.max_backups, 7);

    let proxy = config.proxy_config;
    assert_eq!(proxy.bind_address, "0.0.0.0");
    assert_eq!(proxy.https_port, Some(8443));
    assert_eq!(proxy.default_timeout, Duration::from_secs(2));
    assert_eq!(proxy.connect_timeout, Duration::from_secs(5));
    assert_eq!(proxy.redirects["api.example.com"], "http://127.0.0.1:9001/v1");
    assert_eq!(proxy.static_hosts["status.example.com"].status, 200);
}

#[test]
fn unclosed_brace_does_not_swallow_later_routes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        r#"
environment: dev
proxyConfig:
  httpPort: 80
  staticHosts:
    s.example.com:
      body: "cost ${5"
  redirects:
    api.example.com: http://127.0.0.1:9001
"#,
    );
    let config = load_config(&path).unwrap();
    assert_eq!(config.proxy_config.static_hosts["s.example.com"].body, "cost 5");
    assert_eq!(
        config.proxy_config.redirects["api.example.com"],
        "http://127.0.0.1:9001"
    );
}

#[test]
fn unknown_environment_fails_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "environment: staging\nproxyConfig:\n  httpPort: 80\n",
    );
    assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_certificate_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        r#"
environment: dev
proxyConfig:
  httpPort: 80
  httpsPort: 443
  certFile: /no/such/cert.pem
  keyFile: /no/such/key.pem
"#,
    );
    match load_config(&path) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors
                .iter()
                .any(|e| matches!(e, ValidationError::TlsFileNotFound { .. })));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.example.yaml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.environment, Environment::Dev);
    assert!(!config.proxy_config.redirects.is_empty());
}
