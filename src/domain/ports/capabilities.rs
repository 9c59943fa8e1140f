//! Capability Factory Port
//!
//! Supplies the default collaborators when the caller doesn't inject its own.

use std::path::Path;

use super::{LocalExecutor, RemoteExecutor, SourceProvider, TransferEngine};

pub trait CapabilityFactory {
    /// Version control bound to the source directory
    fn source_provider(&self, srcdir: &Path) -> Box<dyn SourceProvider>;

    fn transfer_engine(&self) -> Box<dyn TransferEngine>;

    fn local_executor(&self) -> Box<dyn LocalExecutor>;

    fn remote_executor(&self) -> Box<dyn RemoteExecutor>;
}
