//! Listing catalog port - Read-only lookup of listing details.
//!
//! Sessions are always anchored to a listing. The registry resolves the
//! listing snapshot through this port before a session is created; if the
//! lookup fails, no session comes into existence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ListingId;
use crate::domain::listing::ListingRef;

/// Port for resolving listing details from the marketplace catalog.
#[async_trait]
pub trait ListingCatalog: Send + Sync {
    /// Fetches the listing snapshot for an id.
    async fn fetch(&self, id: &ListingId) -> Result<ListingRef, CatalogError>;
}

/// Errors from the listing catalog.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// No listing with that id exists.
    #[error("listing '{0}' not found")]
    NotFound(ListingId),

    /// Catalog backend is unreachable or failing.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ListingCatalog) {}

    #[test]
    fn not_found_names_the_listing() {
        let id = ListingId::new("casa-verde-12").unwrap();
        let err = CatalogError::NotFound(id);
        assert_eq!(err.to_string(), "listing 'casa-verde-12' not found");
    }
}
