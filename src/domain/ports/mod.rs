//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod capabilities;
pub mod deploy_events;
pub mod executor;
pub mod source_provider;
pub mod transfer_engine;

pub use capabilities::CapabilityFactory;
pub use deploy_events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use executor::{ExecError, LocalExecutor, RemoteExecutor, DEFAULT_COMMAND_TIMEOUT};
pub use source_provider::{SourceError, SourceProvider, SourceResult};
pub use transfer_engine::{TransferEngine, TransferError, TransferFlags, TransferRequest};
