//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` or `{name}_FAILED` when closed
//! - Logs `{name}_INCOMPLETE` if dropped without being closed

use std::cell::Cell;
use std::time::{Duration, Instant};

use super::logger::Logger;

/// A scope that automatically logs begin and complete events
///
/// ```ignore
/// let scope = ObservationScope::with_fields("MIGRATE", &[("environment", "dev")]);
/// // ... do work ...
/// scope.complete_with_fields(&[("duration_ms", "12")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope with fields repeated on every event
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);

        Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    fn field_refs<'s>(&'s self, extra: &[(&'s str, &'s str)]) -> Vec<(&'s str, &'s str)> {
        let mut all: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.extend(extra.iter().copied());
        all
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        Logger::info(&format!("{}_COMPLETE", self.name), &self.field_refs(extra_fields));
    }

    /// Mark the scope as failed
    ///
    /// Logs `{name}_FAILED` at ERROR level.
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        Logger::error(
            &format!("{}_FAILED", self.name),
            &self.field_refs(&[("reason", reason)]),
        );
    }

    /// Mark the scope as failed with FATAL severity
    pub fn fail_fatal(self, reason: &str) {
        self.completed.set(true);
        Logger::fatal(
            &format!("{}_FAILED", self.name),
            &self.field_refs(&[("reason", reason)]),
        );
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Wall-clock timer
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_creation() {
        let scope = ObservationScope::with_fields("TEST", &[]);
        assert!(!scope.completed.get());
        scope.complete_with_fields(&[]);
    }

    #[test]
    fn test_scope_with_fields_complete() {
        let scope = ObservationScope::with_fields("TEST", &[("environment", "dev")]);
        scope.complete_with_fields(&[("duration_ms", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::with_fields("TEST", &[("environment", "dev")]);
        scope.fail("connection refused");
    }

    #[test]
    fn test_scope_fail_fatal() {
        let scope = ObservationScope::with_fields("TEST", &[]);
        scope.fail_fatal("unrecoverable error");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::with_fields("TEST", &[]);
        drop(scope);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }
}
