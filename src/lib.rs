//! Beam - deployment orchestrator
//!
//! Beam exports a branch (or uses the working copy), runs the configured
//! pre/post commands locally and on the server, and synchronizes the files
//! with rsync over ssh.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    resolve_options, DeployOrchestrator, DeployOrchestratorBuilder, PathOption, RawOptions,
    RunOptions,
};
pub use config::{BeamConfig, ConfigWarning};
pub use domain::entities::{
    CommandDefinition, DeploymentResult, ResultEntry, ServerDefinition, UpdateKind,
};
pub use domain::value_objects::{CancelToken, Direction, Location, OutputKind, Phase, Stage};
pub use error::{BeamError, BeamResult, SetupError};
