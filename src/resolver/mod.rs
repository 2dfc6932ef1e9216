//! Environment resolution
//!
//! Turns a selector into a plan: the ordered list of environment names a
//! run will process. Resolution never touches a database and never checks
//! that a named environment exists; that is left to the migration manager.

mod selector;

pub use selector::{Selector, ALL};

use crate::config::{is_sentinel, Config, ConfigResult, EnvironmentRegistry};

/// How a plan was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// One environment. `defaulted` is set when no selector was given.
    Single { defaulted: bool },
    /// Every environment
    All,
    /// A shard of the registry
    Sharded { offset: usize, division: usize },
}

/// Ordered environments for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    mode: PlanMode,
    environments: Vec<String>,
}

impl ResolvedPlan {
    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// True for `all` and sharded plans, which report an aggregate time
    pub fn is_batch(&self) -> bool {
        !matches!(self.mode, PlanMode::Single { .. })
    }

    /// True when the default environment was substituted for a missing
    /// selector
    pub fn is_defaulted(&self) -> bool {
        matches!(self.mode, PlanMode::Single { defaulted: true })
    }
}

/// Resolve a raw `--environment` value against the loaded config
pub fn resolve(raw: Option<&str>, config: &Config) -> ConfigResult<ResolvedPlan> {
    plan(&Selector::parse(raw), config.registry(), || {
        config.default_environment()
    })
}

/// Resolve a parsed selector.
///
/// `default_environment` is only called for `Selector::Default`.
pub fn plan<F>(
    selector: &Selector,
    registry: &EnvironmentRegistry,
    default_environment: F,
) -> ConfigResult<ResolvedPlan>
where
    F: FnOnce() -> ConfigResult<String>,
{
    let resolved = match selector {
        Selector::Default => ResolvedPlan {
            mode: PlanMode::Single { defaulted: true },
            environments: vec![default_environment()?],
        },
        Selector::All => ResolvedPlan {
            mode: PlanMode::All,
            environments: registry.environment_names().map(str::to_string).collect(),
        },
        Selector::Sharded { offset, division } => ResolvedPlan {
            mode: PlanMode::Sharded {
                offset: *offset,
                division: *division,
            },
            environments: shard(registry, *offset, *division),
        },
        Selector::Named(name) => ResolvedPlan {
            mode: PlanMode::Single { defaulted: false },
            environments: vec![name.clone()],
        },
    };

    Ok(resolved)
}

/// Names at slots `offset, offset + division, ...` below `registry.len()`.
///
/// Metadata keys count as slots but are left out of the result.
/// A zero division or an offset past the end yields nothing.
fn shard(registry: &EnvironmentRegistry, offset: usize, division: usize) -> Vec<String> {
    if division == 0 {
        return Vec::new();
    }

    (offset..registry.len())
        .step_by(division)
        .filter_map(|position| registry.key_at(position))
        .filter(|key| !is_sentinel(key))
        .map(str::to_string)
        .collect()
}
