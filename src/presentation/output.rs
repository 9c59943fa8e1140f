//! Output Rendering
//!
//! Console rendering for deploy events, command output and results.
//! JSON output lives in `infrastructure::events`.

use crate::domain::entities::{DeploymentResult, UpdateKind};
use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::domain::value_objects::{OutputKind, OutputSink};

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// NDJSON events for scripting
    Json,
}

/// Icons for output rendering
#[derive(Debug, Clone, Copy)]
struct Icons {
    check: &'static str,
    arrow: &'static str,
    bullet: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            check: "✓",
            arrow: "→",
            bullet: "•",
        }
    }

    fn ascii() -> Self {
        Self {
            check: "[OK]",
            arrow: "->",
            bullet: "*",
        }
    }

    fn select(unicode: bool) -> Self {
        if unicode {
            Self::unicode()
        } else {
            Self::ascii()
        }
    }
}

/// Progress on stderr, so stdout stays free for command output
pub struct ConsoleEventSink {
    unicode: bool,
    verbose: u8,
}

impl ConsoleEventSink {
    pub fn new(unicode: bool, verbose: u8) -> Self {
        Self { unicode, verbose }
    }

    /// One line per event; `None` for events hidden at this verbosity
    pub fn render(&self, event: &DeployEvent) -> Option<String> {
        let icons = Icons::select(self.unicode);
        match event {
            DeployEvent::SetupCompleted {
                remote,
                direction,
                branch,
                working_copy,
            } => {
                let source = match (working_copy, branch) {
                    (true, _) => "working copy".to_string(),
                    (false, Some(branch)) => format!("branch {}", branch),
                    (false, None) => "no branch".to_string(),
                };
                Some(format!("Deploying {} {} ({})", direction, remote, source))
            }
            DeployEvent::Prepared { branch, local_path } => Some(format!(
                "{} Exported {} to {}",
                icons.check,
                branch,
                local_path.display()
            )),
            DeployEvent::PhaseStarted {
                stage,
                command_count,
            } => Some(format!(
                "Running {} {} command{}",
                command_count,
                stage,
                if *command_count == 1 { "" } else { "s" }
            )),
            DeployEvent::CommandStarted { command, .. } if self.verbose > 0 => {
                Some(format!("  {} {}", icons.arrow, command))
            }
            DeployEvent::CommandStarted { .. } | DeployEvent::CommandFinished { .. } => None,
            DeployEvent::TransferStarted {
                engine,
                source,
                destination,
                dry_run,
            } => Some(format!(
                "{}{} {} {} {}",
                if *dry_run { "[dry-run] " } else { "" },
                engine,
                source,
                icons.arrow,
                destination
            )),
            DeployEvent::Completed { .. } => None,
        }
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        if let Some(line) = self.render(&event) {
            eprintln!("{}", line);
        }
    }

    fn wants_detailed_events(&self) -> bool {
        self.verbose > 0
    }
}

/// Forwards command output to the terminal
///
/// Remote and stdout lines go to stdout, stderr lines to stderr.
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn emit(&self, kind: OutputKind, line: &str) {
        match kind {
            OutputKind::Out | OutputKind::Remote => println!("{}", line),
            OutputKind::Err => eprintln!("{}", line),
        }
    }
}

/// Raw transfer output, shown only at `-v`
pub struct TransferOutput {
    pub verbose: u8,
}

impl OutputSink for TransferOutput {
    fn emit(&self, kind: OutputKind, line: &str) {
        if self.verbose > 0 || kind == OutputKind::Err {
            ConsoleOutput.emit(kind, line);
        }
    }
}

/// Per-kind summary of a result
pub fn render_summary(result: &DeploymentResult, dry_run: bool, unicode: bool) -> String {
    let icons = Icons::select(unicode);
    let mut out = String::new();

    if result.is_empty() {
        out.push_str(&format!("{} Already up-to-date\n", icons.check));
        return out;
    }

    let title = if dry_run {
        "Changes (dry run)"
    } else {
        "Deploy complete"
    };
    out.push_str(&format!("{} {}: {} items\n", icons.check, title, result.len()));
    for (kind, count) in result.summary() {
        out.push_str(&format!("  {:<11} {}\n", kind.as_str(), count));
    }
    out
}

/// The changed files, grouped in `UpdateKind::ALL` order
pub fn render_changes(result: &DeploymentResult, unicode: bool) -> String {
    let icons = Icons::select(unicode);
    let mut out = String::new();
    for kind in UpdateKind::ALL {
        let paths: Vec<&str> = result
            .iter()
            .filter(|entry| entry.update == kind)
            .map(|entry| entry.path.as_str())
            .collect();
        if paths.is_empty() {
            continue;
        }
        out.push_str(&format!("  {} ({}):\n", kind, paths.len()));
        for path in paths {
            out.push_str(&format!("    {} {}\n", icons.bullet, path));
        }
    }
    out
}
