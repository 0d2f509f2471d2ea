//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::env::expand_env;
use crate::config::schema::Config;
use crate::config::validation::{validate_config, ValidationError};

/// Conventional config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "../config/config.yaml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("error reading config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, expand, parse and validate configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&expand_env(&content))
}

/// Parse and validate configuration text. No environment expansion.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = load_config(Path::new("/no/such/dir/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn validation_errors_are_joined() {
        let yaml = r#"
environment: dev
proxyConfig:
  httpPort: 80
  redirects:
    a.example.com: "nope"
    "b.example.com:80": "http://127.0.0.1:1"
"#;
        let err = parse_config(yaml).unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains(", "));
    }

    #[test]
    fn parse_error_surfaces_yaml_message() {
        let err = parse_config("environment: [dev\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
