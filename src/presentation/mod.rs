//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Wiring the orchestrator with infrastructure dependencies
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - Argument definitions
//! - `factory` - Default capabilities (dependency injection)
//! - `output` - Console rendering

pub mod cli;
pub mod factory;
pub mod output;

pub use factory::{create_orchestrator, DefaultCapabilities};
