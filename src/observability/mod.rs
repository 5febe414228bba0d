//! Observability for docstore
//!
//! - Structured logging (one JSON object per line)
//! - Typed events
//! - Per-engine write/read counters
//!
//! Observability is read-only: nothing here changes what the store does.
//!
//! ```ignore
//! use docstore::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::StoreLoad, &[("documents", "3")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, PersistMetrics};

/// Default severity an event is logged at
fn default_severity(event: Event) -> Severity {
    match event {
        Event::PersistWriteFailed | Event::StoreDecodeFailed => Severity::Error,
        Event::PersistReadFailed | Event::PersistDirSyncFailed | Event::OperationRejected => {
            Severity::Warn
        }
        Event::PersistRead | Event::PersistWriteBegin | Event::PersistWriteCoalesced => {
            Severity::Trace
        }
        _ => Severity::Info,
    }
}

/// Log an event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(default_severity(event), event.as_str(), fields);
}
