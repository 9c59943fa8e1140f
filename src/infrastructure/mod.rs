//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `vcs/` - Source providers (git)
//! - `transfer/` - Transfer engines (rsync)
//! - `exec/` - Local and ssh command executors
//! - `events/` - Event sinks (NDJSON)
//! - `process` - Streaming subprocess runner shared by the above

pub mod events;
pub mod exec;
pub(crate) mod process;
pub mod transfer;
pub mod vcs;

// Re-export for convenience
pub use events::JsonEventSink;
pub use exec::{ProcessExecutor, SshExecutor};
pub use transfer::RsyncTransfer;
pub use vcs::GitSourceProvider;
