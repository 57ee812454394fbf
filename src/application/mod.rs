//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod autopilot;
pub mod handlers;
pub mod registry;

pub use autopilot::{AutopilotDispatcher, DispatchSettings};
pub use registry::{Acquired, SessionCell, SessionRegistry};
