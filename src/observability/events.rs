//! Observable events for envmigrate
//!
//! Events are explicit and typed.

use std::fmt;

/// Lifecycle events of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// No selector given, default environment substituted
    DefaultEnvironmentUsed,
    /// Selector resolved into a plan
    PlanResolved,
    /// Plan has no environments
    PlanEmpty,
    /// Batch (all or sharded) started
    BatchStart,
    /// Batch finished, possibly with failures
    BatchComplete,
    /// An environment failed with a recoverable error and was skipped
    EnvironmentSkipped,
    /// Run aborted by an unrecoverable error
    RunAborted,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DefaultEnvironmentUsed => "DEFAULT_ENVIRONMENT_USED",
            Event::PlanResolved => "PLAN_RESOLVED",
            Event::PlanEmpty => "PLAN_EMPTY",
            Event::BatchStart => "BATCH_START",
            Event::BatchComplete => "BATCH_COMPLETE",
            Event::EnvironmentSkipped => "ENVIRONMENT_SKIPPED",
            Event::RunAborted => "RUN_ABORTED",
        }
    }

    /// Whether the event ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RunAborted)
    }

    /// Whether the event reports a condition the operator should see
    /// without `-v`
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::DefaultEnvironmentUsed | Event::PlanEmpty | Event::EnvironmentSkipped
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_abort_is_fatal() {
        assert!(Event::RunAborted.is_fatal());
        assert!(!Event::EnvironmentSkipped.is_fatal());
        assert!(!Event::BatchComplete.is_fatal());
    }

    #[test]
    fn test_warnings() {
        assert!(Event::DefaultEnvironmentUsed.is_warning());
        assert!(Event::EnvironmentSkipped.is_warning());
        assert!(!Event::PlanResolved.is_warning());
    }

    #[test]
    fn test_display() {
        assert_eq!(Event::PlanResolved.to_string(), "PLAN_RESOLVED");
    }
}
