//! Configuration for envmigrate
//!
//! The config file is a single JSON object:
//!
//! ```json
//! {
//!   "manager": { "command": ["migrator", "up"] },
//!   "environments": {
//!     "default_migration_table": "schema_log",
//!     "default_database": "development",
//!     "development": { "adapter": "mysql", "name": "dev_db" }
//!   }
//! }
//! ```
//!
//! Loaded once per process and read-only afterwards.

mod errors;
mod registry;

pub use errors::{ConfigError, ConfigResult};
pub use registry::{
    is_sentinel, EnvironmentConfig, EnvironmentRegistry, RegistryEntry,
    DEFAULT_DATABASE_KEY, DEFAULT_MIGRATION_TABLE_KEY,
};

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Process variable that overrides the default environment
pub const DEFAULT_ENVIRONMENT_VAR: &str = "ENVMIGRATE_ENVIRONMENT";

/// External migration command settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManagerSettings {
    /// Program followed by its leading arguments
    pub command: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    environments: Map<String, Value>,

    #[serde(default)]
    manager: Option<ManagerSettings>,
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    registry: EnvironmentRegistry,
    manager: Option<ManagerSettings>,
}

impl Config {
    /// Build a configuration around an existing registry
    pub fn new(registry: EnvironmentRegistry) -> Self {
        Self {
            registry,
            manager: None,
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig = serde_json::from_str(content)?;
        let registry = EnvironmentRegistry::from_json(&raw.environments)?;

        let config = Self {
            registry,
            manager: raw.manager,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if let Some(manager) = &self.manager {
            match manager.command.first() {
                None => return Err(ConfigError::invalid("manager.command must not be empty")),
                Some(program) if program.trim().is_empty() => {
                    return Err(ConfigError::invalid("manager.command program must not be blank"))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// The environment registry
    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    /// Look up one environment
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.registry.get(name)
    }

    /// External migration command, if configured
    pub fn manager(&self) -> Option<&ManagerSettings> {
        self.manager.as_ref()
    }

    pub fn with_manager(mut self, manager: ManagerSettings) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Default environment for runs without an explicit selector.
    ///
    /// Reads `ENVMIGRATE_ENVIRONMENT` from the process environment.
    pub fn default_environment(&self) -> ConfigResult<String> {
        let from_env = std::env::var(DEFAULT_ENVIRONMENT_VAR).ok();
        self.default_environment_with(from_env.as_deref())
    }

    /// Default environment, given the value of the override variable.
    ///
    /// Order of precedence:
    /// 1. non-empty override (must exist)
    /// 2. `default_database` (must exist)
    /// 3. first environment in registry order
    pub fn default_environment_with(&self, override_name: Option<&str>) -> ConfigResult<String> {
        if let Some(name) = override_name.filter(|n| !n.is_empty()) {
            return self.existing(name);
        }

        if let Some(name) = self.registry.default_database() {
            return self.existing(name);
        }

        self.registry
            .environment_names()
            .next()
            .map(str::to_string)
            .ok_or(ConfigError::NoDefaultEnvironment)
    }

    fn existing(&self, name: &str) -> ConfigResult<String> {
        if self.registry.contains(name) {
            Ok(name.to_string())
        } else {
            Err(ConfigError::MissingEnvironment(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Config {
        Config::from_json_str(
            &json!({
                "environments": {
                    "default_migration_table": "schema_log",
                    "development": { "adapter": "sqlite" },
                    "testing": { "adapter": "mysql" },
                    "default_database": "testing"
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("envmigrate.json");
        fs::write(
            &config_path,
            json!({ "environments": { "dev": { "adapter": "pgsql" } } }).to_string(),
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.environment("dev").unwrap().adapter.as_deref(), Some("pgsql"));
        assert!(config.manager().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_environments_required() {
        let result = Config::from_json_str("{}");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_manager_command_validated() {
        let result = Config::from_json_str(
            &json!({ "environments": {}, "manager": { "command": [] } }).to_string(),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let config = Config::from_json_str(
            &json!({ "environments": {}, "manager": { "command": ["migrator", "up"] } })
                .to_string(),
        )
        .unwrap();
        assert_eq!(config.manager().unwrap().command, vec!["migrator", "up"]);
    }

    #[test]
    fn test_default_environment_prefers_override() {
        let config = sample();
        assert_eq!(config.default_environment_with(Some("development")).unwrap(), "development");
    }

    #[test]
    fn test_default_environment_empty_override_ignored() {
        let config = sample();
        assert_eq!(config.default_environment_with(Some("")).unwrap(), "testing");
    }

    #[test]
    fn test_default_environment_override_must_exist() {
        let config = sample();
        assert!(matches!(
            config.default_environment_with(Some("nowhere")),
            Err(ConfigError::MissingEnvironment(_))
        ));
    }

    #[test]
    fn test_default_environment_uses_default_database() {
        assert_eq!(sample().default_environment_with(None).unwrap(), "testing");
    }

    #[test]
    fn test_default_database_must_exist() {
        let config = Config::from_json_str(
            &json!({ "environments": { "dev": {}, "default_database": "prod" } }).to_string(),
        )
        .unwrap();
        assert!(matches!(
            config.default_environment_with(None),
            Err(ConfigError::MissingEnvironment(_))
        ));
    }

    #[test]
    fn test_default_environment_falls_back_to_first() {
        let config = Config::from_json_str(
            &json!({
                "environments": {
                    "default_migration_table": "log",
                    "staging": {},
                    "production": {}
                }
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(config.default_environment_with(None).unwrap(), "staging");
    }

    #[test]
    fn test_no_default_environment() {
        let config = Config::from_json_str(&json!({ "environments": {} }).to_string()).unwrap();
        assert!(matches!(
            config.default_environment_with(None),
            Err(ConfigError::NoDefaultEnvironment)
        ));
    }
}
