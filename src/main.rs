//! envmigrate CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments (via cli::run)
//! 2. Dispatches to CLI commands (via cli::run)
//! 3. Prints errors to stderr
//! 4. Exits with the error's status: 2 when environments failed, 1 otherwise
//!
//! All logic is delegated to the CLI module.

use envmigrate::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
