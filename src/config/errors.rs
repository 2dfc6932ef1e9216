//! Configuration errors
//!
//! All configuration errors are fatal: they are raised before any
//! environment is dispatched.

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Duplicate environment key: {0}")]
    DuplicateKey(String),

    #[error("The environment configuration for '{0}' is missing")]
    MissingEnvironment(String),

    #[error("Could not find a default environment")]
    NoDefaultEnvironment,
}

impl ConfigError {
    /// Shorthand for a validation failure
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_environment_message() {
        let err = ConfigError::MissingEnvironment("staging".into());
        assert_eq!(
            err.to_string(),
            "The environment configuration for 'staging' is missing"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Invalid config JSON"));
    }
}
