//! CLI argument definitions using clap
//!
//! Commands:
//! - envmigrate migrate [-e <environment>] [-t <target>]
//! - envmigrate plan [-e <environment>]

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// envmigrate - run database migrations across many environments
#[derive(Parser, Debug)]
#[command(name = "envmigrate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short = 'c',
        long = "configuration",
        global = true,
        default_value = "./envmigrate.json"
    )]
    pub config: PathBuf,

    /// More log output on stderr (-v info, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Migrate the database
    ///
    /// Examples:
    ///   envmigrate migrate -e development
    ///   envmigrate migrate -e development -t 20110103081132
    ///   envmigrate migrate -e all
    ///   envmigrate migrate -e 0/4
    #[command(verbatim_doc_comment)]
    Migrate {
        /// Target environment: a name, "all", or "<offset>/<division>"
        #[arg(short, long)]
        environment: Option<String>,

        /// The version number to migrate to
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Print the environments a selector resolves to, without migrating
    Plan {
        /// Target environment: a name, "all", or "<offset>/<division>"
        #[arg(short, long)]
        environment: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::try_parse_from([
            "envmigrate", "migrate", "-e", "all", "-t", "20110103081132",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("./envmigrate.json"));
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Command::Migrate { environment, target } => {
                assert_eq!(environment.as_deref(), Some("all"));
                assert_eq!(target.as_deref(), Some("20110103081132"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "envmigrate", "migrate", "--environment", "1/3", "-c", "conf.json", "-vv",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("conf.json"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_environment_optional() {
        let cli = Cli::try_parse_from(["envmigrate", "migrate"]).unwrap();
        match cli.command {
            Command::Migrate { environment, target } => {
                assert!(environment.is_none());
                assert!(target.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from(["envmigrate", "plan", "-e", "0/2"]).unwrap();
        assert!(matches!(cli.command, Command::Plan { environment: Some(ref e) } if e == "0/2"));
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
