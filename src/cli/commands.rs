//! CLI command implementations
//!
//! Each command loads the configuration once, resolves the selector into a
//! plan, and, for `migrate`, hands the plan to the dispatcher.

use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::dispatcher::{
    BatchOutcome, CommandManager, Dispatcher, DryRunManager, Manager, MigrationRequest, VersionId,
};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::reporter::Reporter;
use crate::resolver::{self, Selector};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    Logger::set_min_severity(Severity::from_verbosity(cli.verbose));
    run_command(&cli.config, cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Migrate {
            environment,
            target,
        } => {
            let request = MigrationRequest::new(environment, target.map(VersionId::from));
            migrate(config_path, &request)
        }
        Command::Plan { environment } => plan(config_path, environment.as_deref()),
    }
}

/// Load and log the configuration
pub fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;

    let path = config_path.display().to_string();
    let slots = config.registry().len().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("slots", slots.as_str())],
    );

    Ok(config)
}

/// Migrate the selected environments
///
/// Uses the configured migration command, or a dry run when none is set.
/// A finished run with failed environments is reported as
/// `CliErrorCode::BatchFailed` after the full report is printed.
pub fn migrate(config_path: &Path, request: &MigrationRequest) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut reporter = Reporter::stdout();

    let mut manager: Box<dyn Manager + '_> = match config.manager() {
        Some(settings) => Box::new(CommandManager::new(settings, config.registry())),
        None => {
            reporter.dry_run_notice()?;
            Box::new(DryRunManager::new(config.registry()))
        }
    };

    let batch = execute(&config, request, manager.as_mut(), &mut reporter)?;

    if batch.has_failures() {
        return Err(CliError::batch_failed(&batch));
    }

    Ok(())
}

/// Resolve, dispatch, and report one request.
///
/// Returns the batch even when some environments failed; only
/// unrecoverable errors come back as `Err`, after the environments that
/// did run have been reported.
pub fn execute<M, W>(
    config: &Config,
    request: &MigrationRequest,
    manager: &mut M,
    reporter: &mut Reporter<W>,
) -> CliResult<BatchOutcome>
where
    M: Manager + ?Sized,
    W: Write,
{
    let selector = Selector::parse(request.selector.as_deref());
    let plan = resolver::plan(&selector, config.registry(), || config.default_environment())?;

    let selector = selector.to_string();
    let planned = plan.len().to_string();
    log_event_with_fields(
        Event::PlanResolved,
        &[("selector", selector.as_str()), ("environments", planned.as_str())],
    );
    if plan.is_defaulted() {
        if let Some(name) = plan.environments().first() {
            log_event_with_fields(Event::DefaultEnvironmentUsed, &[("environment", name.as_str())]);
        }
    }

    let result = Dispatcher::new(config.registry(), manager, reporter)
        .run_plan(&plan, request.target.as_ref());

    let batch = match result {
        Ok(batch) => batch,
        Err(e) => {
            let reason = e.to_string();
            log_event_with_fields(Event::RunAborted, &[("reason", reason.as_str())]);
            if let Some(partial) = e.partial() {
                reporter.report_aborted(&plan, partial)?;
            }
            return Err(e.into());
        }
    };

    reporter.report(&plan, &batch)?;

    Ok(batch)
}

/// Print the environments a selector resolves to
pub fn plan(config_path: &Path, selector: Option<&str>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut reporter = Reporter::stdout();
    print_plan(&config, selector, &mut reporter)
}

/// Resolve a selector and list the plan on `reporter`
pub fn print_plan<W: Write>(
    config: &Config,
    selector: Option<&str>,
    reporter: &mut Reporter<W>,
) -> CliResult<()> {
    let plan = resolver::resolve(selector, config)?;
    if plan.is_defaulted() {
        if let Some(name) = plan.environments().first() {
            log_event_with_fields(Event::DefaultEnvironmentUsed, &[("environment", name.as_str())]);
        }
    }
    reporter.plan_listing(&plan)?;
    Ok(())
}
