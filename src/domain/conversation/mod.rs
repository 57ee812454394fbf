//! Conversation domain module.
//!
//! Dialogue turns and the append-only per-session message log.

mod log;
mod message;

pub use log::MessageLog;
pub use message::{Message, Sender};
