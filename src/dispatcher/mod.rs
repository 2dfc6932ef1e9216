//! Migration dispatch
//!
//! Runs a resolved plan one environment at a time, in plan order:
//!
//! 1. Announce the environment and its configured adapter and naming
//! 2. Call `Manager::migrate` exactly once, timed
//! 3. Recover database driver and invalid argument failures, record them,
//!    and move on to the next environment
//! 4. Stop the whole plan on any other failure
//!
//! There is no concurrency here. Sharded selectors let operators run
//! several processes side by side; each process still runs its own shard
//! sequentially.

mod command;
mod manager;
mod outcome;
mod request;

pub use command::{environment_variables, CommandManager, EXIT_INVALID_ARGUMENT};
pub use manager::{DryRunManager, Manager, ManagerError};
pub use outcome::{BatchOutcome, ExecutionOutcome, FailureKind, OutcomeStatus};
pub use request::{MigrationRequest, VersionId};

use std::io::{self, Write};

use thiserror::Error;

use crate::config::EnvironmentRegistry;
use crate::observability::{log_event, log_event_with_fields, Event, ObservationScope, Timer};
use crate::reporter::Reporter;
use crate::resolver::ResolvedPlan;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An unclassified manager failure; the rest of the plan is not run.
    ///
    /// `partial` holds the outcomes of the environments that ran before.
    #[error("Migration of '{environment}' aborted: {source}")]
    Fatal {
        environment: String,
        #[source]
        source: ManagerError,
        partial: BatchOutcome,
    },

    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}

impl DispatchError {
    /// Outcomes recorded before the run stopped, if it stopped mid-plan
    pub fn partial(&self) -> Option<&BatchOutcome> {
        match self {
            DispatchError::Fatal { partial, .. } => Some(partial),
            DispatchError::Io(_) => None,
        }
    }
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Runs environments through a manager and reports as it goes
pub struct Dispatcher<'a, M: Manager + ?Sized, W: Write> {
    registry: &'a EnvironmentRegistry,
    manager: &'a mut M,
    reporter: &'a mut Reporter<W>,
}

impl<'a, M: Manager + ?Sized, W: Write> Dispatcher<'a, M, W> {
    pub fn new(
        registry: &'a EnvironmentRegistry,
        manager: &'a mut M,
        reporter: &'a mut Reporter<W>,
    ) -> Self {
        Self {
            registry,
            manager,
            reporter,
        }
    }

    /// Migrate a single environment.
    ///
    /// Recoverable failures come back as a failed outcome; unclassified
    /// ones as `DispatchError::Fatal`.
    pub fn run_one(
        &mut self,
        environment: &str,
        target: Option<&VersionId>,
    ) -> DispatchResult<ExecutionOutcome> {
        self.dispatch(environment, target, false)
    }

    /// Migrate every environment of a plan, in order.
    ///
    /// Continues past recoverable failures. Returns on the first
    /// unclassified failure without touching later environments; the
    /// error then carries every outcome recorded so far.
    pub fn run_plan(
        &mut self,
        plan: &ResolvedPlan,
        target: Option<&VersionId>,
    ) -> DispatchResult<BatchOutcome> {
        let timer = Timer::new();
        let mut batch = BatchOutcome::new();
        let planned = plan.len().to_string();

        if plan.is_batch() {
            log_event_with_fields(Event::BatchStart, &[("environments", planned.as_str())]);
        }
        if plan.is_empty() {
            log_event(Event::PlanEmpty);
        }

        for environment in plan.environments() {
            match self.dispatch(environment, target, plan.is_defaulted()) {
                Ok(outcome) => batch.record(outcome),
                Err(DispatchError::Fatal {
                    environment,
                    source,
                    ..
                }) => {
                    batch.finish(timer.elapsed());
                    return Err(DispatchError::Fatal {
                        environment,
                        source,
                        partial: batch,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        batch.finish(timer.elapsed());

        if plan.is_batch() {
            let succeeded = batch.succeeded_count().to_string();
            let failed = batch.failed_count().to_string();
            let elapsed_ms = batch.elapsed().as_millis().to_string();
            log_event_with_fields(
                Event::BatchComplete,
                &[
                    ("environments", planned.as_str()),
                    ("succeeded", succeeded.as_str()),
                    ("failed", failed.as_str()),
                    ("elapsed_ms", elapsed_ms.as_str()),
                ],
            );
        }

        Ok(batch)
    }

    fn dispatch(
        &mut self,
        environment: &str,
        target: Option<&VersionId>,
        defaulted: bool,
    ) -> DispatchResult<ExecutionOutcome> {
        if defaulted {
            self.reporter.default_environment(environment)?;
        } else {
            self.reporter.using_environment(environment)?;
        }
        if let Some(env) = self.registry.get(environment) {
            self.reporter.environment_details(env)?;
        }

        let target_str = target.map(VersionId::as_str).unwrap_or("latest");
        let scope = ObservationScope::with_fields(
            "MIGRATE",
            &[("environment", environment), ("target", target_str)],
        );

        let timer = Timer::new();
        let result = self.manager.migrate(environment, target);
        let duration = timer.elapsed();
        let duration_ms = duration.as_millis().to_string();

        let err = match result {
            Ok(()) => {
                scope.complete_with_fields(&[("duration_ms", duration_ms.as_str())]);
                self.reporter.run_elapsed(duration)?;
                return Ok(ExecutionOutcome::succeeded(environment, duration));
            }
            Err(err) => err,
        };

        match err.kind() {
            Some(kind) => {
                scope.fail(err.message());
                log_event_with_fields(
                    Event::EnvironmentSkipped,
                    &[("environment", environment), ("kind", kind.as_str())],
                );
                self.reporter.skipped(err.message())?;
                self.reporter.run_elapsed(duration)?;
                Ok(ExecutionOutcome::failed(environment, duration, kind, err.message()))
            }
            None => {
                scope.fail_fatal(err.message());
                self.reporter.run_aborted(duration)?;
                Err(DispatchError::Fatal {
                    environment: environment.to_string(),
                    source: err,
                    partial: BatchOutcome::new(),
                })
            }
        }
    }
}
