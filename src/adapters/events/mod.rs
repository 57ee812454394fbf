//! Session event adapters.
//!
//! - `BroadcastHub` - In-process room-per-session fan-out backing the
//!   WebSocket event stream
mod broadcast;

pub use broadcast::BroadcastHub;
