//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

pub mod branch;
mod cancel;
mod direction;
mod output;
mod stage;

pub use cancel::CancelToken;
pub use direction::Direction;
pub use output::{NoopOutput, OutputKind, OutputSink};
pub use stage::{Location, Phase, Stage};
