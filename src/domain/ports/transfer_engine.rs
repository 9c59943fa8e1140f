//! Transfer Engine Port
//!
//! Abstracts the file synchronization between the local path and a server.
//! The orchestrator passes direction and flags through unchanged.

use std::path::Path;

use thiserror::Error;

use crate::domain::entities::{DeploymentResult, ServerDefinition};
use crate::domain::value_objects::{CancelToken, Direction, OutputSink};

/// Error during a transfer
#[derive(Debug, Error)]
pub enum TransferError {
    /// The engine ran and reported failure
    #[error("{0}")]
    Failed(String),

    /// The engine's tooling is missing
    #[error("{0} is not available")]
    Unavailable(String),

    /// The transfer was interrupted
    #[error("transfer cancelled")]
    Cancelled,
}

/// Flags that shape the synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFlags {
    pub dry_run: bool,
    pub checksum: bool,
    pub delete: bool,
    pub archive: bool,
    pub compress: bool,
    pub delay_updates: bool,
}

impl Default for TransferFlags {
    fn default() -> Self {
        Self {
            dry_run: false,
            checksum: true,
            delete: false,
            archive: true,
            compress: true,
            delay_updates: true,
        }
    }
}

/// Everything an engine needs for one transfer
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub direction: Direction,
    /// Local side of the transfer (export directory or working copy)
    pub local_path: &'a Path,
    pub server: &'a ServerDefinition,
    /// Extra path below both roots
    pub path: Option<&'a str>,
    /// Exclude patterns file, relative to `local_path`
    pub excludes_file: &'a str,
    pub flags: TransferFlags,
}

/// Trait for transfer engines
pub trait TransferEngine {
    /// Name of the engine (for events and messages)
    fn name(&self) -> &'static str;

    /// Remote root for a server, in the engine's addressing scheme
    fn remote_path(&self, server: &ServerDefinition) -> String;

    /// Synchronize and report what changed (or would change, in dry-run)
    fn deploy(
        &self,
        request: &TransferRequest<'_>,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<DeploymentResult, TransferError>;
}
