//! Deploy Module
//!
//! Orchestrates a deploy run for Beam.
//!
//! ## Usage
//!
//! ```ignore
//! use beam::application::{resolve_options, DeployOrchestrator, RawOptions};
//!
//! let options = resolve_options(RawOptions::new("up", "prod", srcdir), &config)?;
//! let mut orchestrator = DeployOrchestrator::builder(config, factory).build(options)?;
//! let result = orchestrator.run(&deployment_output, &command_output)?;
//! ```

mod orchestrator;

pub use orchestrator::{DeployOrchestrator, DeployOrchestratorBuilder, Preparation};
