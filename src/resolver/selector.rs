//! Environment selector parsing
//!
//! Accepted forms:
//! - absent: the configured default environment
//! - `all`: every environment
//! - `<offset>/<division>`: a shard of the registry
//! - anything else: a single environment name, taken literally

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Literal selecting every environment
pub const ALL: &str = "all";

static SHARD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn shard_pattern() -> &'static Regex {
    SHARD_PATTERN
        .get_or_init(|| Regex::new(r"^([0-9]+)/([0-9]+)$").expect("shard pattern is valid"))
}

/// A parsed environment selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// No selector given
    Default,
    /// Every environment in registry order
    All,
    /// Registry slots `offset, offset + division, ...`
    Sharded { offset: usize, division: usize },
    /// One environment, existing or not
    Named(String),
}

impl Selector {
    /// Parse a raw `--environment` value.
    ///
    /// The shard form must be exactly two unsigned integers separated by
    /// one `/`. Near misses (`1/2x`, `-1/2`, `1/2/3`, `2023`) are names.
    /// Integers too large for `usize` saturate.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            None => return Selector::Default,
            Some(raw) => raw,
        };

        if raw == ALL {
            return Selector::All;
        }

        if let Some(caps) = shard_pattern().captures(raw) {
            return Selector::Sharded {
                offset: saturating_parse(&caps[1]),
                division: saturating_parse(&caps[2]),
            };
        }

        Selector::Named(raw.to_string())
    }
}

fn saturating_parse(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Default => write!(f, "<default>"),
            Selector::All => write!(f, "{}", ALL),
            Selector::Sharded { offset, division } => write!(f, "{}/{}", offset, division),
            Selector::Named(name) => write!(f, "{}", name),
        }
    }
}
