//! Environment registry
//!
//! An ordered mapping from environment name to its configuration.
//!
//! Insertion order is fixed at load time and never changes afterwards:
//! sharded selection computes positions against this order, so two
//! processes loading the same file must see the same slot layout.
//!
//! Two keys are registry metadata rather than environments:
//! - `default_migration_table`: migration tracking table inherited by
//!   environments that do not name their own
//! - `default_database`: the environment used when none is selected
//!
//! Both occupy a slot (they count towards `len()`), but are never
//! yielded by `environment_names()`.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::{ConfigError, ConfigResult};

/// Registry key naming the default migration tracking table
pub const DEFAULT_MIGRATION_TABLE_KEY: &str = "default_migration_table";

/// Registry key naming the default environment
pub const DEFAULT_DATABASE_KEY: &str = "default_database";

/// Returns true for the two metadata keys
pub fn is_sentinel(key: &str) -> bool {
    key == DEFAULT_MIGRATION_TABLE_KEY || key == DEFAULT_DATABASE_KEY
}

/// Configuration of a single environment.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment name (the registry key)
    #[serde(skip)]
    pub name: String,

    /// Database adapter kind, e.g. "mysql" or "pgsql"
    #[serde(default)]
    pub adapter: Option<String>,

    /// Database name on the server
    #[serde(default, rename = "name")]
    pub database_name: Option<String>,

    #[serde(default)]
    pub table_prefix: Option<String>,

    #[serde(default)]
    pub table_suffix: Option<String>,

    /// Migration tracking table
    #[serde(default)]
    pub migration_table: Option<String>,

    /// Remaining connection settings (host, port, user, ...), passed
    /// through untouched to the migration manager
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl EnvironmentConfig {
    /// Create an empty configuration for the named environment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn with_table_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.table_suffix = Some(suffix.into());
        self
    }
}

/// A registry slot
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEntry {
    /// A real environment
    Environment(EnvironmentConfig),
    /// Value of a metadata key
    Metadata(String),
}

/// Ordered environment registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentRegistry {
    entries: Vec<(String, RegistryEntry)>,
}

impl EnvironmentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the `environments` object of a config file.
    ///
    /// Object order is kept as slot order. Environments without their own
    /// `migration_table` inherit `default_migration_table`.
    pub fn from_json(environments: &Map<String, Value>) -> ConfigResult<Self> {
        let mut registry = Self::new();

        for (key, value) in environments {
            if is_sentinel(key) {
                let text = value.as_str().ok_or_else(|| {
                    ConfigError::invalid(format!("'{}' must be a string", key))
                })?;
                registry.push_metadata(key.clone(), text)?;
                continue;
            }

            if !value.is_object() {
                return Err(ConfigError::invalid(format!(
                    "environment '{}' must be an object",
                    key
                )));
            }

            let mut env: EnvironmentConfig = serde_json::from_value(value.clone())?;
            env.name = key.clone();
            registry.push_environment(env)?;
        }

        if let Some(table) = registry.default_migration_table().map(str::to_string) {
            for (_, entry) in registry.entries.iter_mut() {
                if let RegistryEntry::Environment(env) = entry {
                    env.migration_table.get_or_insert_with(|| table.clone());
                }
            }
        }

        Ok(registry)
    }

    /// Append an environment slot
    pub fn push_environment(&mut self, env: EnvironmentConfig) -> ConfigResult<()> {
        if is_sentinel(&env.name) {
            return Err(ConfigError::invalid(format!(
                "'{}' is reserved and cannot name an environment",
                env.name
            )));
        }
        self.ensure_unique(&env.name)?;
        self.entries
            .push((env.name.clone(), RegistryEntry::Environment(env)));
        Ok(())
    }

    /// Append a metadata slot
    pub fn push_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ConfigResult<()> {
        let key = key.into();
        if !is_sentinel(&key) {
            return Err(ConfigError::invalid(format!(
                "'{}' is not a registry metadata key",
                key
            )));
        }
        self.ensure_unique(&key)?;
        self.entries.push((key, RegistryEntry::Metadata(value.into())));
        Ok(())
    }

    fn ensure_unique(&self, key: &str) -> ConfigResult<()> {
        if self.entries.iter().any(|(k, _)| k == key) {
            return Err(ConfigError::DuplicateKey(key.to_string()));
        }
        Ok(())
    }

    /// Number of slots, metadata keys included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key at a 0-based slot position
    pub fn key_at(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(|(k, _)| k.as_str())
    }

    /// All keys in slot order, metadata keys included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Environment names in slot order, metadata keys excluded
    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|k| !is_sentinel(k))
    }

    /// Look up an environment by name
    pub fn get(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.entries.iter().find_map(|(k, entry)| match entry {
            RegistryEntry::Environment(env) if k == name => Some(env),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn metadata(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, entry)| match entry {
            RegistryEntry::Metadata(value) if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Value of `default_migration_table`, if configured
    pub fn default_migration_table(&self) -> Option<&str> {
        self.metadata(DEFAULT_MIGRATION_TABLE_KEY)
    }

    /// Value of `default_database`, if configured
    pub fn default_database(&self) -> Option<&str> {
        self.metadata(DEFAULT_DATABASE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_keeps_insertion_order() {
        let registry = EnvironmentRegistry::from_json(&as_map(json!({
            "zeta": {},
            "default_database": "zeta",
            "alpha": {},
            "mid": {}
        })))
        .unwrap();

        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(keys, vec!["zeta", "default_database", "alpha", "mid"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_environment_names_skip_metadata() {
        let registry = EnvironmentRegistry::from_json(&as_map(json!({
            "default_migration_table": "schema_log",
            "db1": {},
            "default_database": "db1",
            "db2": {}
        })))
        .unwrap();

        let names: Vec<_> = registry.environment_names().collect();
        assert_eq!(names, vec!["db1", "db2"]);
    }

    #[test]
    fn test_parses_environment_fields() {
        let registry = EnvironmentRegistry::from_json(&as_map(json!({
            "production": {
                "adapter": "mysql",
                "name": "prod_db",
                "table_prefix": "p_",
                "table_suffix": "_s",
                "host": "db.internal",
                "port": 3306
            }
        })))
        .unwrap();

        let env = registry.get("production").unwrap();
        assert_eq!(env.name, "production");
        assert_eq!(env.adapter.as_deref(), Some("mysql"));
        assert_eq!(env.database_name.as_deref(), Some("prod_db"));
        assert_eq!(env.table_prefix.as_deref(), Some("p_"));
        assert_eq!(env.table_suffix.as_deref(), Some("_s"));
        assert_eq!(env.settings["host"], "db.internal");
        assert_eq!(env.settings["port"], 3306);
        assert!(!env.settings.contains_key("adapter"));
    }

    #[test]
    fn test_inherits_default_migration_table() {
        // Metadata key placed after the environments still applies
        let registry = EnvironmentRegistry::from_json(&as_map(json!({
            "a": {},
            "b": { "migration_table": "own_log" },
            "default_migration_table": "shared_log"
        })))
        .unwrap();

        assert_eq!(registry.get("a").unwrap().migration_table.as_deref(), Some("shared_log"));
        assert_eq!(registry.get("b").unwrap().migration_table.as_deref(), Some("own_log"));
    }

    #[test]
    fn test_rejects_non_string_metadata() {
        let result = EnvironmentRegistry::from_json(&as_map(json!({
            "default_database": { "adapter": "mysql" }
        })));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_scalar_environment() {
        let result = EnvironmentRegistry::from_json(&as_map(json!({
            "dev": "mysql://localhost"
        })));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_push_rejects_duplicates_and_reserved_names() {
        let mut registry = EnvironmentRegistry::new();
        registry.push_environment(EnvironmentConfig::new("dev")).unwrap();

        assert!(matches!(
            registry.push_environment(EnvironmentConfig::new("dev")),
            Err(ConfigError::DuplicateKey(_))
        ));
        assert!(registry
            .push_environment(EnvironmentConfig::new(DEFAULT_DATABASE_KEY))
            .is_err());
        assert!(registry.push_metadata("dev2", "x").is_err());
    }

    #[test]
    fn test_get_does_not_return_metadata() {
        let mut registry = EnvironmentRegistry::new();
        registry.push_metadata(DEFAULT_DATABASE_KEY, "dev").unwrap();

        assert!(registry.get(DEFAULT_DATABASE_KEY).is_none());
        assert_eq!(registry.default_database(), Some("dev"));
        assert_eq!(registry.key_at(0), Some(DEFAULT_DATABASE_KEY));
        assert_eq!(registry.key_at(1), None);
    }
}
