//! Manager backed by an external migration command
//!
//! The configured program runs once per environment:
//!
//! ```text
//! <program> <args...> [--target <version>]
//! ```
//!
//! with the environment's settings exported as `ENVMIGRATE_*` variables.
//!
//! Exit status mapping:
//! - 0: success
//! - 2: invalid argument (bad target version, unknown environment)
//! - any other status, or killed by a signal: database driver error
//!
//! Failing to start the program at all is unclassified: it is not caused
//! by the environment and would fail for every environment alike.

use std::process::{Command, Stdio};

use serde_json::Value;

use crate::config::{EnvironmentConfig, EnvironmentRegistry, ManagerSettings};
use crate::observability::Logger;

use super::manager::{unknown_environment, Manager, ManagerError};
use super::request::VersionId;

/// Exit status the command uses for invalid arguments
pub const EXIT_INVALID_ARGUMENT: i32 = 2;

const ENV_PREFIX: &str = "ENVMIGRATE_";

/// Runs the configured migration command per environment
#[derive(Debug)]
pub struct CommandManager<'a> {
    program: String,
    args: Vec<String>,
    registry: &'a EnvironmentRegistry,
}

impl<'a> CommandManager<'a> {
    /// Build from config settings.
    ///
    /// `settings.command` is non-empty after config validation.
    pub fn new(settings: &ManagerSettings, registry: &'a EnvironmentRegistry) -> Self {
        let mut parts = settings.command.iter().cloned();
        let program = parts.next().unwrap_or_default();

        Self {
            program,
            args: parts.collect(),
            registry,
        }
    }

    fn build(&self, env: &EnvironmentConfig, target: Option<&VersionId>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);

        if let Some(target) = target {
            command.arg("--target").arg(target.as_str());
        }

        command.envs(environment_variables(env));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        command
    }
}

impl Manager for CommandManager<'_> {
    fn migrate(
        &mut self,
        environment: &str,
        target: Option<&VersionId>,
    ) -> Result<(), ManagerError> {
        let env = self
            .registry
            .get(environment)
            .ok_or_else(|| unknown_environment(environment))?;

        Logger::trace(
            "MANAGER_COMMAND_START",
            &[("environment", environment), ("program", self.program.as_str())],
        );

        let output = self.build(env, target).output().map_err(|e| {
            ManagerError::unclassified(format!("Failed to run '{}': {}", self.program, e))
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("'{}' exited with {}", self.program, output.status));

        match output.status.code() {
            Some(EXIT_INVALID_ARGUMENT) => Err(ManagerError::InvalidArgument(message)),
            _ => Err(ManagerError::DatabaseDriver(message)),
        }
    }
}

/// Variables exported to the command for one environment.
///
/// Extra settings become `ENVMIGRATE_<KEY>` with the key upper-cased and
/// non-alphanumerics replaced by `_`. Only scalar settings are exported.
/// A setting whose variable name matches a reserved one is not exported:
/// `ENVMIGRATE_ENVIRONMENT` always names the environment being migrated.
pub fn environment_variables(env: &EnvironmentConfig) -> Vec<(String, String)> {
    let mut vars = vec![(var_name(RESERVED[0]), env.name.clone())];

    let known = [
        &env.adapter,
        &env.database_name,
        &env.table_prefix,
        &env.table_suffix,
        &env.migration_table,
    ];
    for (key, value) in RESERVED[1..].iter().zip(known) {
        if let Some(value) = value {
            vars.push((var_name(key), value.clone()));
        }
    }

    for (key, value) in &env.settings {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        let name = var_name(key);
        if is_reserved(&name) {
            Logger::warn(
                "MANAGER_SETTING_SHADOWED",
                &[("environment", env.name.as_str()), ("setting", key.as_str())],
            );
            continue;
        }
        vars.push((name, rendered));
    }

    vars
}

/// Keys of the variables exported for every environment, in export order
const RESERVED: [&str; 6] = [
    "environment",
    "adapter",
    "database",
    "table_prefix",
    "table_suffix",
    "migration_table",
];

fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|key| var_name(key) == name)
}

fn var_name(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}{}", ENV_PREFIX, suffix)
}
