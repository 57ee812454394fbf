//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers, value objects, and error types that form
//! the vocabulary of the Dealdesk domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{AgentId, BuyerId, LeadId, ListingId, MessageId, SessionKey};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
