//! HTTP listing catalog backed by the marketplace's listing service.
//!
//! Resolves listing snapshots with `GET {base_url}/listings/{id}`. The
//! service answers 404 for unknown ids; everything else that goes wrong is
//! reported as the catalog being unavailable so the caller can refuse to
//! open a session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::domain::foundation::ListingId;
use crate::domain::listing::ListingRef;
use crate::ports::{CatalogError, ListingCatalog};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Listing catalog that queries the marketplace listing service over HTTP.
pub struct HttpCatalog {
    base_url: String,
    client: Client,
}

impl HttpCatalog {
    /// Create a catalog client for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a catalog client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn listing_url(&self, id: &ListingId) -> String {
        format!("{}/listings/{}", self.base_url, id)
    }

    async fn handle_response(
        &self,
        id: &ListingId,
        response: Response,
    ) -> Result<ListingRef, CatalogError> {
        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(id.clone())),
            status if status.is_success() => {
                let document: ListingDocument = response.json().await.map_err(|e| {
                    CatalogError::Unavailable(format!("invalid listing document: {e}"))
                })?;
                document.into_listing()
            }
            status => Err(CatalogError::Unavailable(format!(
                "listing service returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl ListingCatalog for HttpCatalog {
    async fn fetch(&self, id: &ListingId) -> Result<ListingRef, CatalogError> {
        let response = self
            .client
            .get(self.listing_url(id))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Unavailable("listing service timed out".to_string())
                } else {
                    CatalogError::Unavailable(format!("listing service unreachable: {e}"))
                }
            })?;

        self.handle_response(id, response).await
    }
}

// ----- Listing Service API Types -----

#[derive(Debug, Deserialize)]
struct ListingDocument {
    id: String,
    title: String,
    location: String,
    price: f64,
    description: String,
}

impl ListingDocument {
    fn into_listing(self) -> Result<ListingRef, CatalogError> {
        let id = ListingId::new(&self.id)
            .map_err(|e| CatalogError::Unavailable(format!("invalid listing document: {e}")))?;
        ListingRef::new(id, self.title, self.location, self.price, self.description)
            .map_err(|e| CatalogError::Unavailable(format!("invalid listing document: {e}")))
    }
}
