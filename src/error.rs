//! Error types for Beam
//!
//! Uses `thiserror` for library errors. Every failure kind the orchestrator can
//! produce has its own variant so callers can branch on it without string matching.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::ports::SourceError;
use crate::domain::value_objects::Stage;

/// Result type alias for Beam operations
pub type BeamResult<T> = Result<T, BeamError>;

/// Main error type for Beam operations
#[derive(Error, Debug)]
pub enum BeamError {
    /// Bad or missing option or config value, detected before any side effect
    #[error("invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Pre-flight checks rejected the deploy
    #[error("setup failed: {0}")]
    SetupFailed(#[from] SetupError),

    /// A local or remote command exited unsuccessfully
    #[error("{stage} command '{command}' failed{}: {}", exit_suffix(.code), .stderr.trim())]
    CommandFailed {
        stage: Stage,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A local command exceeded its timeout and was killed
    #[error("{stage} command '{command}' timed out after {}s", .timeout.as_secs())]
    CommandTimedOut {
        stage: Stage,
        command: String,
        timeout: Duration,
    },

    /// The ssh session for a remote command could not be established
    #[error("could not connect to {host} for {stage} commands: {message}")]
    RemoteConnectionFailed {
        stage: Stage,
        host: String,
        message: String,
    },

    /// The transfer engine reported a failure
    #[error("transfer failed: {message}")]
    TransferFailed { message: String },

    /// Source control failed while preparing the local path, before any pre-local command
    #[error("source control error: {0}")]
    Source(#[from] SourceError),

    /// A caller passed a value outside the accepted set
    #[error("{0}")]
    InvalidArgument(String),

    /// The run was cancelled through its cancel token
    #[error("deployment cancelled")]
    Cancelled,

    /// Config file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("invalid config {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BeamError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name of the error kind (used in JSON output)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::SetupFailed(inner) => inner.kind(),
            Self::CommandFailed { .. } => "command_failed",
            Self::CommandTimedOut { .. } => "command_timed_out",
            Self::RemoteConnectionFailed { .. } => "remote_connection_failed",
            Self::TransferFailed { .. } => "transfer_failed",
            Self::Source(_) => "source_control",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Cancelled => "cancelled",
            Self::ConfigRead { .. } | Self::ConfigParse { .. } => "config",
            Self::Io(_) => "io",
        }
    }

    /// The lifecycle stage a mid-run failure belongs to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::CommandFailed { stage, .. }
            | Self::CommandTimedOut { stage, .. }
            | Self::RemoteConnectionFailed { stage, .. } => Some(*stage),
            Self::Source(_) => Some(Stage::PreLocal),
            Self::TransferFailed { .. } => Some(Stage::Transfer),
            _ => None,
        }
    }
}

/// Pre-flight failures raised by `DeployOrchestrator::setup`
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("no version control found in {}; deploy from a working copy instead", .path.display())]
    NoVersionControl { path: PathBuf },

    #[error("specified branch \"{branch}\" doesn't match the locked branch \"{locked}\"")]
    BranchLockMismatch { branch: String, locked: String },

    #[error("invalid branch \"{branch}\"; valid options are: {}", quote_list(.available))]
    UnknownBranch {
        branch: String,
        available: Vec<String>,
    },

    #[error("working copy can't be used with the locked remote branch \"{locked}\"")]
    WorkingCopyIncompatibleWithRemoteLock { locked: String },

    #[error("the local path \"{}\" is not writable", .path.display())]
    LocalPathNotWritable { path: PathBuf },

    #[error(
        "the export path \"{}\" overlaps the source directory \"{}\"; choose another exportdir",
        .local_path.display(),
        .srcdir.display()
    )]
    LocalPathOverlapsSource { local_path: PathBuf, srcdir: PathBuf },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SetupError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoVersionControl { .. } => "no_version_control",
            Self::BranchLockMismatch { .. } => "branch_lock_mismatch",
            Self::UnknownBranch { .. } => "unknown_branch",
            Self::WorkingCopyIncompatibleWithRemoteLock { .. } => {
                "working_copy_incompatible_with_remote_lock"
            }
            Self::LocalPathNotWritable { .. } => "local_path_not_writable",
            Self::LocalPathOverlapsSource { .. } => "local_path_overlaps_source",
            Self::Source(_) => "source_control",
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_configuration() {
        let err = BeamError::invalid("direction", "'sideways' is not one of: up, down");
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'direction': 'sideways' is not one of: up, down"
        );
    }

    #[test]
    fn test_error_display_unknown_branch_lists_options() {
        let err = SetupError::UnknownBranch {
            branch: "nope".to_string(),
            available: vec!["main".to_string(), "develop".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "invalid branch \"nope\"; valid options are: 'main', 'develop'"
        );
    }

    #[test]
    fn test_error_display_command_failed() {
        let err = BeamError::CommandFailed {
            stage: Stage::PreLocal,
            command: "make".to_string(),
            code: Some(2),
            stderr: "no rule\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pre-local command 'make' failed with exit code 2: no rule"
        );
        assert_eq!(err.stage(), Some(Stage::PreLocal));
    }

    #[test]
    fn setup_failed_reports_inner_kind() {
        let err = BeamError::from(SetupError::BranchLockMismatch {
            branch: "feature".to_string(),
            locked: "main".to_string(),
        });
        assert_eq!(err.kind(), "branch_lock_mismatch");
    }

    #[test]
    fn connection_failure_keeps_its_stage() {
        let err = BeamError::RemoteConnectionFailed {
            stage: Stage::PreRemote,
            host: "example.com".to_string(),
            message: "Connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not connect to example.com for pre-remote commands: Connection refused"
        );
        assert_eq!(err.stage(), Some(Stage::PreRemote));
    }

    #[test]
    fn source_errors_belong_to_pre_local() {
        let err = BeamError::from(SourceError::CommandFailed {
            command: "git archive".to_string(),
            stderr: "fatal: not a valid object name".to_string(),
        });
        assert_eq!(err.stage(), Some(Stage::PreLocal));
    }

    #[test]
    fn overlap_error_names_both_paths() {
        let err = SetupError::LocalPathOverlapsSource {
            local_path: PathBuf::from("/srv/repo"),
            srcdir: PathBuf::from("/srv/repo"),
        };
        assert_eq!(err.kind(), "local_path_overlaps_source");
        assert!(err.to_string().contains("\"/srv/repo\" overlaps the source directory"));
    }
}
