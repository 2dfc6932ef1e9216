//! CLI-specific error types
//!
//! Every CLI error ends the process. The exit status separates a run that
//! finished with failed environments (2) from a run that could not finish
//! (1).

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::dispatcher::{BatchOutcome, DispatchError};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Unclassified migration failure stopped the run
    MigrationAborted,
    /// Run finished, some environments failed
    BatchFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ENVMIGRATE_CONFIG_ERROR",
            Self::IoError => "ENVMIGRATE_IO_ERROR",
            Self::MigrationAborted => "ENVMIGRATE_MIGRATION_ABORTED",
            Self::BatchFailed => "ENVMIGRATE_BATCH_FAILED",
        }
    }

    /// Process exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BatchFailed => 2,
            _ => 1,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Migration aborted
    pub fn migration_aborted(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::MigrationAborted, msg)
    }

    /// Some environments of a finished run failed
    pub fn batch_failed(batch: &BatchOutcome) -> Self {
        let names: Vec<&str> = batch.failures().keys().map(String::as_str).collect();
        Self::new(
            CliErrorCode::BatchFailed,
            format!(
                "{} of {} environment(s) failed: {}",
                batch.failed_count(),
                batch.len(),
                names.join(", ")
            ),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Process exit status
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<DispatchError> for CliError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Io(io) => io.into(),
            fatal @ DispatchError::Fatal { .. } => Self::migration_aborted(fatal.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{ExecutionOutcome, FailureKind, ManagerError};
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::config_error("x").exit_code(), 1);
        assert_eq!(CliError::migration_aborted("x").exit_code(), 1);
        assert_eq!(CliError::new(CliErrorCode::BatchFailed, "x").exit_code(), 2);
    }

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("Could not find a default environment");
        assert_eq!(
            err.to_string(),
            "ENVMIGRATE_CONFIG_ERROR: Could not find a default environment"
        );
    }

    #[test]
    fn test_from_dispatch_error() {
        let err: CliError = DispatchError::Fatal {
            environment: "db1".into(),
            source: ManagerError::unclassified("driver crashed"),
            partial: BatchOutcome::new(),
        }
        .into();
        assert_eq!(err.code(), &CliErrorCode::MigrationAborted);
        assert!(err.message().contains("db1"));
        assert!(err.message().contains("driver crashed"));

        let broken = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let err: CliError = DispatchError::Io(broken).into();
        assert_eq!(err.code(), &CliErrorCode::IoError);
    }

    #[test]
    fn test_batch_failed_names_environments() {
        let mut batch = BatchOutcome::new();
        batch.record(ExecutionOutcome::failed(
            "db2",
            Duration::ZERO,
            FailureKind::DatabaseDriver,
            "x",
        ));
        batch.record(ExecutionOutcome::succeeded("db3", Duration::ZERO));

        let err = CliError::batch_failed(&batch);
        assert_eq!(err.code(), &CliErrorCode::BatchFailed);
        assert_eq!(err.message(), "1 of 2 environment(s) failed: db2");
    }
}
