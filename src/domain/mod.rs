//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `listing` - Immutable catalog snapshot consumed at session open
//! - `conversation` - Dialogue messages and the append-only log
//! - `session` - Deal-closing state machine for one (buyer, listing) pair
//! - `lead` - Buyer contact validation and the durable lead record

pub mod conversation;
pub mod foundation;
pub mod lead;
pub mod listing;
pub mod session;
