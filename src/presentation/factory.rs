//! Capability Factory
//!
//! Wires the default infrastructure into the orchestrator.
//! This is the dependency injection point for the application.

use std::path::Path;

use crate::config::BeamConfig;
use crate::domain::ports::{
    CapabilityFactory, LocalExecutor, RemoteExecutor, SourceProvider, TransferEngine,
};
use crate::infrastructure::{GitSourceProvider, ProcessExecutor, RsyncTransfer, SshExecutor};
use crate::DeployOrchestratorBuilder;

/// git + rsync + sh + ssh
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCapabilities;

impl CapabilityFactory for DefaultCapabilities {
    fn source_provider(&self, srcdir: &Path) -> Box<dyn SourceProvider> {
        Box::new(GitSourceProvider::new(srcdir))
    }

    fn transfer_engine(&self) -> Box<dyn TransferEngine> {
        Box::new(RsyncTransfer::new())
    }

    fn local_executor(&self) -> Box<dyn LocalExecutor> {
        Box::new(ProcessExecutor)
    }

    fn remote_executor(&self) -> Box<dyn RemoteExecutor> {
        Box::new(SshExecutor::new())
    }
}

/// Create an orchestrator builder with all default dependencies wired up
pub fn create_orchestrator(config: BeamConfig) -> DeployOrchestratorBuilder {
    crate::DeployOrchestrator::builder(config, Box::new(DefaultCapabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities_use_git_and_rsync() {
        let factory = DefaultCapabilities;
        assert_eq!(factory.transfer_engine().name(), "rsync");

        let dir = tempfile::tempdir().unwrap();
        assert!(!factory.source_provider(dir.path()).exists());
    }
}
