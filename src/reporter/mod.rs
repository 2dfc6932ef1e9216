//! Human-readable run report
//!
//! Line-oriented progress and timing output. The wording is for operators,
//! not for machines; structured events go through the logger instead.
//!
//! The reporter only writes. It never changes the plan or an outcome.

use std::io::{self, Write};
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::dispatcher::BatchOutcome;
use crate::resolver::ResolvedPlan;

/// Format a duration the way every timing line shows it
pub fn format_elapsed(duration: Duration) -> String {
    format!("{:.4}s", duration.as_secs_f64())
}

/// Writes the run report to any `Write` sink
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    /// Reporter on stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    /// No migration command configured
    pub fn dry_run_notice(&mut self) -> io::Result<()> {
        writeln!(self.out, "no manager command configured, dry run only")
    }

    /// Warn that no environment was given and name the default
    pub fn default_environment(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "warning no environment specified, defaulting to: {}", name)
    }

    pub fn using_environment(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "using environment {}", name)
    }

    /// Configured adapter, database, and table naming of an environment
    pub fn environment_details(&mut self, env: &EnvironmentConfig) -> io::Result<()> {
        if let Some(adapter) = &env.adapter {
            writeln!(self.out, "using adapter {}", adapter)?;
        }
        if let Some(database) = &env.database_name {
            writeln!(self.out, "using database {}", database)?;
        }
        if let Some(prefix) = &env.table_prefix {
            writeln!(self.out, "using table prefix {}", prefix)?;
        }
        if let Some(suffix) = &env.table_suffix {
            writeln!(self.out, "using table suffix {}", suffix)?;
        }
        Ok(())
    }

    /// Error banner for an environment that failed and was skipped
    pub fn skipped(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "  --== ERROR ==--  skipping: {}", message)
    }

    /// Elapsed time of one environment's migrate call
    pub fn run_elapsed(&mut self, duration: Duration) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "All Done. Took {}", format_elapsed(duration))
    }

    /// Elapsed time of a migrate call that ended the run
    pub fn run_aborted(&mut self, duration: Duration) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Aborted. Took {}", format_elapsed(duration))
    }

    /// Print a plan without running it, one environment per line
    pub fn plan_listing(&mut self, plan: &ResolvedPlan) -> io::Result<()> {
        for name in plan.environments() {
            writeln!(self.out, "{}", name)?;
        }
        Ok(())
    }

    /// Close a run: aggregate time for batch plans, then any failures.
    pub fn report(&mut self, plan: &ResolvedPlan, batch: &BatchOutcome) -> io::Result<()> {
        if plan.is_batch() {
            if plan.is_empty() {
                writeln!(self.out, "No environments selected")?;
            }
            writeln!(
                self.out,
                "All databases complete. Took {}",
                format_elapsed(batch.elapsed())
            )?;
        }

        self.failure_summary(batch)?;
        self.out.flush()
    }

    /// Close a run that stopped mid-plan.
    ///
    /// `batch` holds the environments that ran before the one that ended
    /// the run.
    pub fn report_aborted(
        &mut self,
        plan: &ResolvedPlan,
        batch: &BatchOutcome,
    ) -> io::Result<()> {
        if plan.is_batch() {
            writeln!(
                self.out,
                "Run aborted after {} of {} environment(s). Took {}",
                batch.len(),
                plan.len(),
                format_elapsed(batch.elapsed())
            )?;
        }

        self.failure_summary(batch)?;
        self.out.flush()
    }

    fn failure_summary(&mut self, batch: &BatchOutcome) -> io::Result<()> {
        if batch.has_failures() {
            writeln!(
                self.out,
                "{} of {} environment(s) failed:",
                batch.failed_count(),
                batch.len()
            )?;
            for outcome in batch.outcomes() {
                if let Some(message) = outcome.failure_message() {
                    writeln!(self.out, "  {}: {}", outcome.environment, message)?;
                }
            }
        }
        Ok(())
    }
}
