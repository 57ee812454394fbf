//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `catalog` - Listing lookups (marketplace HTTP service, in-memory)
//! - `events` - Session event fan-out (in-process broadcast hub)
//! - `http` - REST API and WebSocket surface (axum)
//! - `inference` - Reply generation and deal classification (Gemini, mock)
//! - `lead_store` - Captured lead persistence (PostgreSQL, in-memory)

pub mod catalog;
pub mod events;
pub mod http;
pub mod inference;
pub mod lead_store;
