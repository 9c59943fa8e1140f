//! Deploy Event Port
//!
//! Provides an observable interface for deploy operations.
//! Enables progress reporting, JSON event streams, and debugging.

use std::path::PathBuf;

use crate::domain::value_objects::{Direction, Stage};

/// Event emitted during a deploy run
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Setup resolved and validated the options
    SetupCompleted {
        remote: String,
        direction: Direction,
        branch: Option<String>,
        working_copy: bool,
    },

    /// Branch exported into the local path
    Prepared { branch: String, local_path: PathBuf },

    /// A command bucket is about to run
    PhaseStarted { stage: Stage, command_count: usize },

    /// A configured command started
    CommandStarted { stage: Stage, command: String },

    /// A configured command finished successfully
    CommandFinished { stage: Stage, command: String },

    /// File transfer started
    TransferStarted {
        engine: &'static str,
        source: String,
        destination: String,
        dry_run: bool,
    },

    /// Run completed
    Completed {
        dry_run: bool,
        total: usize,
        summary: Vec<(String, usize)>,
    },
}

/// Trait for receiving deploy events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress lines on stderr
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait DeployEventSink: Send + Sync {
    /// Handle a deploy event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants per-command events
    ///
    /// Some sinks (like CI) may only want phase and summary events.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingEventSink {
        events: Arc<Mutex<Vec<DeployEvent>>>,
    }

    impl DeployEventSink for RecordingEventSink {
        fn on_event(&self, event: DeployEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn recording_sink_captures_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingEventSink {
            events: events.clone(),
        };

        sink.on_event(DeployEvent::PhaseStarted {
            stage: Stage::PreLocal,
            command_count: 2,
        });
        sink.on_event(DeployEvent::CommandStarted {
            stage: Stage::PreLocal,
            command: "make".to_string(),
        });

        let recorded = events.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(
            recorded[1],
            DeployEvent::CommandStarted {
                stage: Stage::PreLocal,
                ..
            }
        ));
    }

    #[test]
    fn noop_sink_wants_no_details() {
        assert!(!NoopEventSink.wants_detailed_events());
    }
}
