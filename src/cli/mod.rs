//! CLI module for envmigrate
//!
//! Provides command-line interface for:
//! - migrate: migrate one, all, or a shard of the configured environments
//! - plan: show which environments a selector picks

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{execute, load_config, migrate, plan, print_plan, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
