//! In-memory listing catalog.
//!
//! Backs local development and tests. Production deployments point the
//! session core at the marketplace's catalog service instead; the port
//! surface is identical.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::ListingId;
use crate::domain::listing::ListingRef;
use crate::ports::{CatalogError, ListingCatalog};

/// Listing catalog held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    listings: RwLock<HashMap<ListingId, ListingRef>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with listings.
    pub fn with_listings(listings: Vec<ListingRef>) -> Self {
        let map = listings
            .into_iter()
            .map(|l| (l.id().clone(), l))
            .collect();
        Self {
            listings: RwLock::new(map),
        }
    }

    /// Adds or replaces a listing.
    pub async fn insert(&self, listing: ListingRef) {
        self.listings
            .write()
            .await
            .insert(listing.id().clone(), listing);
    }

    /// Removes a listing.
    pub async fn remove(&self, id: &ListingId) -> Option<ListingRef> {
        self.listings.write().await.remove(id)
    }
}

#[async_trait]
impl ListingCatalog for InMemoryCatalog {
    async fn fetch(&self, id: &ListingId) -> Result<ListingRef, CatalogError> {
        self.listings
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}
