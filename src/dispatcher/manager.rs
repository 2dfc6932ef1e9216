//! Migration manager seam
//!
//! The manager is the engine that applies schema changes to one
//! environment and tracks applied versions. The dispatcher only relies on
//! the `Manager` trait and on how failures are classified.

use thiserror::Error;

use crate::config::EnvironmentRegistry;
use crate::observability::Logger;

use super::outcome::FailureKind;
use super::request::VersionId;

/// Errors reported by a manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// Connection or SQL execution failure against the target database
    #[error("{0}")]
    DatabaseDriver(String),

    /// Malformed target version or environment reference
    #[error("{0}")]
    InvalidArgument(String),

    /// Anything else; never recovered
    #[error("{0}")]
    Unclassified(String),
}

impl ManagerError {
    pub fn database_driver(msg: impl Into<String>) -> Self {
        ManagerError::DatabaseDriver(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ManagerError::InvalidArgument(msg.into())
    }

    pub fn unclassified(msg: impl Into<String>) -> Self {
        ManagerError::Unclassified(msg.into())
    }

    /// Recoverable failure kind, or `None` for unclassified errors
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ManagerError::DatabaseDriver(_) => Some(FailureKind::DatabaseDriver),
            ManagerError::InvalidArgument(_) => Some(FailureKind::InvalidArgument),
            ManagerError::Unclassified(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ManagerError::DatabaseDriver(m)
            | ManagerError::InvalidArgument(m)
            | ManagerError::Unclassified(m) => m,
        }
    }
}

/// Applies migrations to one environment at a time
pub trait Manager {
    /// Migrate `environment` up to `target`, or to the latest version when
    /// no target is given
    fn migrate(
        &mut self,
        environment: &str,
        target: Option<&VersionId>,
    ) -> Result<(), ManagerError>;
}

pub(crate) fn unknown_environment(environment: &str) -> ManagerError {
    ManagerError::invalid_argument(format!(
        "The environment \"{}\" does not exist",
        environment
    ))
}

/// Manager that checks the environment exists and records the call
/// without touching any database.
///
/// Used when the config names no migration command.
#[derive(Debug)]
pub struct DryRunManager<'a> {
    registry: &'a EnvironmentRegistry,
    calls: Vec<(String, Option<VersionId>)>,
}

impl<'a> DryRunManager<'a> {
    pub fn new(registry: &'a EnvironmentRegistry) -> Self {
        Self {
            registry,
            calls: Vec::new(),
        }
    }

    /// Environments migrated so far, in call order
    pub fn calls(&self) -> &[(String, Option<VersionId>)] {
        &self.calls
    }
}

impl Manager for DryRunManager<'_> {
    fn migrate(
        &mut self,
        environment: &str,
        target: Option<&VersionId>,
    ) -> Result<(), ManagerError> {
        if !self.registry.contains(environment) {
            return Err(unknown_environment(environment));
        }

        let target_str = target.map(VersionId::as_str).unwrap_or("latest");
        Logger::info(
            "DRY_RUN_MIGRATE",
            &[("environment", environment), ("target", target_str)],
        );

        self.calls.push((environment.to_string(), target.cloned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ManagerError::database_driver("x").kind(),
            Some(FailureKind::DatabaseDriver)
        );
        assert_eq!(
            ManagerError::invalid_argument("x").kind(),
            Some(FailureKind::InvalidArgument)
        );
        assert_eq!(ManagerError::unclassified("x").kind(), None);
    }

    #[test]
    fn test_message_and_display() {
        let err = ManagerError::database_driver("SQLSTATE[HY000] [2002] Connection refused");
        assert_eq!(err.message(), "SQLSTATE[HY000] [2002] Connection refused");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn test_dry_run_records_calls() {
        let mut registry = EnvironmentRegistry::new();
        registry.push_environment(EnvironmentConfig::new("dev")).unwrap();

        let mut manager = DryRunManager::new(&registry);
        manager.migrate("dev", None).unwrap();
        manager.migrate("dev", Some(&VersionId::from("20110103081132"))).unwrap();

        assert_eq!(manager.calls().len(), 2);
        assert_eq!(manager.calls()[1].1.as_ref().unwrap().as_str(), "20110103081132");
    }

    #[test]
    fn test_dry_run_rejects_unknown_environment() {
        let registry = EnvironmentRegistry::new();
        let mut manager = DryRunManager::new(&registry);

        let err = manager.migrate("ghost", None).unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::InvalidArgument));
        assert!(err.message().contains("ghost"));
        assert!(manager.calls().is_empty());
    }
}
