//! Domain Layer
//!
//! The deploy model without I/O: servers, commands, results, and the ports
//! that infrastructure implements.
//!
//! ## Structure
//!
//! - `entities/` - Servers, commands and transfer results
//! - `value_objects/` - Direction, stages, cancellation, output sinks
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never spawns processes or touches the network
//! 2. **Ports & Adapters** - All I/O goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod value_objects;
