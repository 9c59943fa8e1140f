//! JSON Event Sink
//!
//! Outputs deploy events as NDJSON for CI/automation consumption.

use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::domain::value_objects::{OutputKind, OutputSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
///
/// Also accepts command and transfer output, one `output` event per line.
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer (for testing)
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Terminal failure of a run
    pub fn error(&self, kind: &str, message: &str) {
        self.write_event(serde_json::json!({
            "event": "error",
            "command": "deploy",
            "kind": kind,
            "message": message,
        }));
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        let json = match event {
            DeployEvent::SetupCompleted {
                remote,
                direction,
                branch,
                working_copy,
            } => {
                serde_json::json!({
                    "event": "start",
                    "command": "deploy",
                    "remote": remote,
                    "direction": direction.as_str(),
                    "branch": branch,
                    "working_copy": working_copy,
                })
            }

            DeployEvent::Prepared { branch, local_path } => {
                serde_json::json!({
                    "event": "prepared",
                    "command": "deploy",
                    "branch": branch,
                    "local_path": local_path.display().to_string(),
                })
            }

            DeployEvent::PhaseStarted {
                stage,
                command_count,
            } => {
                serde_json::json!({
                    "event": "phase_start",
                    "command": "deploy",
                    "stage": stage.as_str(),
                    "command_count": command_count,
                })
            }

            DeployEvent::CommandStarted { stage, command } => {
                serde_json::json!({
                    "event": "command_start",
                    "command": "deploy",
                    "stage": stage.as_str(),
                    "run": command,
                })
            }

            DeployEvent::CommandFinished { stage, command } => {
                serde_json::json!({
                    "event": "command_finish",
                    "command": "deploy",
                    "stage": stage.as_str(),
                    "run": command,
                })
            }

            DeployEvent::TransferStarted {
                engine,
                source,
                destination,
                dry_run,
            } => {
                serde_json::json!({
                    "event": "transfer_start",
                    "command": "deploy",
                    "engine": engine,
                    "source": source,
                    "destination": destination,
                    "dry_run": dry_run,
                })
            }

            DeployEvent::Completed {
                dry_run,
                total,
                summary,
            } => {
                let counts: serde_json::Map<String, serde_json::Value> = summary
                    .into_iter()
                    .map(|(kind, count)| (kind, serde_json::Value::from(count)))
                    .collect();
                serde_json::json!({
                    "event": "complete",
                    "command": "deploy",
                    "status": "success",
                    "dry_run": dry_run,
                    "total": total,
                    "counts": counts,
                })
            }
        };

        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}

impl OutputSink for JsonEventSink {
    fn emit(&self, kind: OutputKind, line: &str) {
        self.write_event(serde_json::json!({
            "event": "output",
            "command": "deploy",
            "stream": kind.as_str(),
            "line": line,
        }));
    }
}
