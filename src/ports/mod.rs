//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `InferenceClient` - Text completion and deal-signal classification
//! - `ListingCatalog` - Read-only listing lookup
//! - `LeadStore` - Durable persistence for captured leads
//! - `SessionEventPublisher` - Live fan-out of session activity

mod catalog;
mod events;
mod inference;
mod lead_store;

pub use catalog::{CatalogError, ListingCatalog};
pub use events::{SessionEvent, SessionEventPublisher};
pub use inference::{InferenceClient, InferenceError};
pub use lead_store::{LeadStore, LeadStoreError};
