//! Listing snapshot supplied by the catalog collaborator.
//!
//! The core never writes back to the catalog; a `ListingRef` is an
//! immutable input captured when the session opens.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ListingId, ValidationError};

/// Immutable snapshot of the catalog data a session needs.
///
/// Only the fields the inference prompts and the lead record use are
/// carried; everything else stays with the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRef {
    id: ListingId,
    title: String,
    location: String,
    price: f64,
    description: String,
}

impl ListingRef {
    /// Creates a listing snapshot.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if title is empty
    /// - `OutOfRange` if price is negative
    pub fn new(
        id: ListingId,
        title: impl Into<String>,
        location: impl Into<String>,
        price: f64,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if price < 0.0 {
            return Err(ValidationError::out_of_range("price", 0.0, f64::MAX, price));
        }
        Ok(Self {
            id,
            title,
            location: location.into(),
            price,
            description: description.into(),
        })
    }

    /// Returns the catalog identifier.
    pub fn id(&self) -> &ListingId {
        &self.id
    }

    /// Returns the listing title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the listing location.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the asking price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Returns the listing description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_id() -> ListingId {
        ListingId::new("listing-7").unwrap()
    }

    #[test]
    fn new_accepts_complete_listing() {
        let listing = ListingRef::new(
            listing_id(),
            "Sunny 2BR Apartment",
            "Riverside District",
            245_000.0,
            "Bright two-bedroom with balcony.",
        )
        .unwrap();

        assert_eq!(listing.title(), "Sunny 2BR Apartment");
        assert_eq!(listing.location(), "Riverside District");
        assert_eq!(listing.price(), 245_000.0);
    }

    #[test]
    fn new_rejects_empty_title() {
        let result = ListingRef::new(listing_id(), "   ", "Somewhere", 100.0, "desc");
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn new_rejects_negative_price() {
        let result = ListingRef::new(listing_id(), "Title", "Somewhere", -5.0, "desc");
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn serializes_round_trip() {
        let listing = ListingRef::new(listing_id(), "Loft", "Old Town", 88_000.0, "Top floor loft")
            .unwrap();
        let json = serde_json::to_string(&listing).unwrap();
        let back: ListingRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, listing);
    }
}
