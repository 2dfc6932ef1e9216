//! Observability for envmigrate
//!
//! - Structured logging (JSON, stderr)
//! - Lifecycle event tracing
//! - Scoped begin/complete logging and timers
//!
//! Observability is read-only: it never changes the outcome of a run.
//!
//! ```ignore
//! use envmigrate::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::PlanResolved, &[("environments", "3")]);
//!
//! let scope = ObservationScope::with_fields("MIGRATE", &[("environment", "dev")]);
//! // ... do work ...
//! scope.complete_with_fields(&[("duration_ms", "12")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}
