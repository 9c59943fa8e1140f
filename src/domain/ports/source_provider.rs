//! Source Provider Port
//!
//! Version control capability used when deploying from an exported branch
//! instead of the working copy.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error from a source provider
#[derive(Debug, Error)]
pub enum SourceError {
    /// A VCS command exited unsuccessfully
    #[error("{command} failed: {}", .stderr.trim())]
    CommandFailed { command: String, stderr: String },

    /// `update_branch` was given a branch that isn't remote-tracking
    #[error("branch \"{0}\" is not a remote branch")]
    NotRemoteBranch(String),

    /// Another process holds the export directory
    #[error("could not lock export directory {}: {source}", .path.display())]
    ExportLocked {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Branch listing and export over a version-controlled source tree
pub trait SourceProvider {
    /// Whether the source directory is under version control
    fn exists(&self) -> bool;

    /// The branch currently checked out
    fn current_branch(&self) -> SourceResult<String>;

    /// Every branch a deploy may name, local and remote-tracking
    fn available_branches(&self) -> SourceResult<Vec<String>>;

    /// Refresh a remote-tracking branch from its remote
    fn update_branch(&self, branch: &str) -> SourceResult<()>;

    /// Materialize `branch` into `destination`, replacing its contents
    fn export(&self, branch: &str, destination: &Path) -> SourceResult<()>;
}
