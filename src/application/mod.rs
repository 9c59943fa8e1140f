//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, ports)
//! - Does NOT spawn processes itself (that's Infrastructure)
//! - Coordinates option resolution, setup and the deploy lifecycle
//!
//! ## Use Cases
//!
//! - `resolve_options` - Validate caller options against the config
//! - `DeployOrchestrator` - Setup checks, local preparation, commands and transfer

pub mod deploy;
pub mod options;

pub use deploy::{DeployOrchestrator, DeployOrchestratorBuilder, Preparation};
pub use options::{resolve_options, PathOption, RawOptions, RunOptions};
