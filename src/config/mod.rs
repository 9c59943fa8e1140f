//! Configuration module for Beam
//!
//! A project config declares the deploy servers and the commands run around
//! each transfer. It lives next to the source tree as `beam.json`,
//! `beam.toml` or `beam.yaml`, unless a path is given explicitly.

mod loader;
mod types;

pub use loader::{ConfigWarning, CONFIG_FILE_NAMES};
pub use types::BeamConfig;
