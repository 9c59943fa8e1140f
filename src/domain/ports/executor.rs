//! Command Executor Ports
//!
//! Local commands run as subprocesses; remote commands run over a fresh
//! authenticated session per invocation.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::domain::entities::ServerDefinition;
use crate::domain::value_objects::{CancelToken, OutputSink};

/// Default timeout for a local command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Error from running a command
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command ran and exited unsuccessfully
    #[error("exited unsuccessfully ({code:?}): {}", .stderr.trim())]
    Failed { code: Option<i32>, stderr: String },

    /// The command was killed after its timeout
    #[error("timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    /// The remote session could not be established
    #[error("connection failed: {0}")]
    Connection(String),

    /// The command was killed because the run was cancelled
    #[error("cancelled")]
    Cancelled,

    /// The process could not be started
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Runs commands on the local machine
pub trait LocalExecutor {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Duration,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<(), ExecError>;
}

/// Runs commands on a server, from its webroot
pub trait RemoteExecutor {
    fn run(
        &self,
        server: &ServerDefinition,
        command: &str,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<(), ExecError>;
}
