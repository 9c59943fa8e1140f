//! Domain Entities
//!
//! - `ServerDefinition` / `CommandDefinition` - what the config declares
//! - `DeploymentResult` - per-file outcome of a transfer

mod deployment_result;
mod server;

pub use deployment_result::{ChangeReason, DeploymentResult, FileType, ResultEntry, UpdateKind};
pub use server::{CommandDefinition, ServerDefinition};
