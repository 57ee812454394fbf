//! Lead Store Adapters.
//!
//! Implementations of the LeadStore port.
//!
//! ## Available Adapters
//!
//! - `PostgresLeadStore` - Durable storage in PostgreSQL
//! - `InMemoryLeadStore` - Process-local storage for development and tests

mod in_memory;
mod postgres;

pub use in_memory::InMemoryLeadStore;
pub use postgres::PostgresLeadStore;
