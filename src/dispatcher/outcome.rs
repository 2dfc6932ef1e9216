//! Per-environment outcomes and their batch collection

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Failure kinds recovered at the environment boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection or SQL execution failure
    DatabaseDriver,
    /// Malformed target version or environment reference
    InvalidArgument,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::DatabaseDriver => "database_driver",
            FailureKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of migrating one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed { kind: FailureKind, message: String },
}

/// One environment's outcome and how long the migrate call took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub environment: String,
    pub duration: Duration,
    pub status: OutcomeStatus,
}

impl ExecutionOutcome {
    pub fn succeeded(environment: impl Into<String>, duration: Duration) -> Self {
        Self {
            environment: environment.into(),
            duration,
            status: OutcomeStatus::Succeeded,
        }
    }

    pub fn failed(
        environment: impl Into<String>,
        duration: Duration,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            duration,
            status: OutcomeStatus::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    /// Failure message, if any
    pub fn failure_message(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed { message, .. } => Some(message),
        }
    }
}

/// Outcomes of a whole plan, in plan order.
///
/// A single collection is threaded through every environment of the plan,
/// so no failure is lost between environments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    outcomes: Vec<ExecutionOutcome>,
    failures: BTreeMap<String, Vec<String>>,
    elapsed: Duration,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one environment's outcome
    pub fn record(&mut self, outcome: ExecutionOutcome) {
        if let Some(message) = outcome.failure_message() {
            self.failures
                .entry(outcome.environment.clone())
                .or_default()
                .push(message.to_string());
        }
        self.outcomes.push(outcome);
    }

    /// Set the wall-clock time of the whole plan
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn outcomes(&self) -> &[ExecutionOutcome] {
        &self.outcomes
    }

    /// Failure messages per environment; environments that succeeded have
    /// no entry
    pub fn failures(&self) -> &BTreeMap<String, Vec<String>> {
        &self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.len() - self.failed_count()
    }
}
