//! Listing catalog adapters.
//!
//! - `HttpCatalog` - Queries the marketplace listing service
//! - `InMemoryCatalog` - Local development and tests

mod http;
mod in_memory;

pub use http::HttpCatalog;
pub use in_memory::InMemoryCatalog;
