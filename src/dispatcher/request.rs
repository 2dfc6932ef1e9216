//! Migration request built from CLI input

use std::cmp::Ordering;
use std::fmt;

/// Opaque migration target identifier.
///
/// Passed verbatim to the manager; only the manager interprets it.
/// Unsigned integer versions (the usual timestamp-derived ones) order
/// numerically and sort before any other version; the rest order
/// lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u128> {
        self.0.parse().ok()
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for VersionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// One `migrate` invocation: which environments, up to which version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationRequest {
    /// Raw `--environment` value
    pub selector: Option<String>,
    /// Raw `--target` value
    pub target: Option<VersionId>,
}

impl MigrationRequest {
    pub fn new(selector: Option<String>, target: Option<VersionId>) -> Self {
        Self { selector, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        assert!(VersionId::from("9") < VersionId::from("10"));
        assert!(VersionId::from("20110103081132") < VersionId::from("20120111235330"));
    }

    #[test]
    fn test_lexical_fallback() {
        assert!(VersionId::from("abc") < VersionId::from("abd"));
        assert_eq!(VersionId::from("v1").cmp(&VersionId::from("v1")), Ordering::Equal);
    }

    #[test]
    fn test_numeric_before_other() {
        assert!(VersionId::from("10") < VersionId::from("1a"));
        assert!(VersionId::from("9") < VersionId::from("1a"));
    }

    #[test]
    fn test_leading_zeros_are_distinct_but_adjacent() {
        let a = VersionId::from("007");
        let b = VersionId::from("7");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert!(a < VersionId::from("8"));
    }

    #[test]
    fn test_passed_verbatim() {
        assert_eq!(VersionId::from(" 2011 ").as_str(), " 2011 ");
        assert_eq!(VersionId::from("2011").to_string(), "2011");
    }
}
