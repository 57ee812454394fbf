//! Durable lead record produced by a successful capture.

use serde::{Deserialize, Serialize};

use super::BuyerContact;
use crate::domain::conversation::Message;
use crate::domain::foundation::{LeadId, SessionKey, Timestamp};
use crate::domain::listing::ListingRef;
use crate::domain::session::DealKind;

/// A captured lead: buyer contact details plus the conversation context
/// that produced the commitment.
///
/// Owned by the lead store (CRM) once persisted; the session core never
/// mutates it again. The snapshot is a copy taken at capture time, so later
/// session messages never appear in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    id: LeadId,
    session_key: SessionKey,
    listing: ListingRef,
    contact: BuyerContact,
    deal_kind: DealKind,
    conversation_snapshot: Vec<Message>,
    created_at: Timestamp,
}

impl Lead {
    /// Builds a lead from validated parts and a log snapshot.
    pub fn new(
        session_key: SessionKey,
        listing: ListingRef,
        contact: BuyerContact,
        deal_kind: DealKind,
        conversation_snapshot: Vec<Message>,
    ) -> Self {
        Self {
            id: LeadId::new(),
            session_key,
            listing,
            contact,
            deal_kind,
            conversation_snapshot,
            created_at: Timestamp::now(),
        }
    }

    /// Returns the lead identifier.
    pub fn id(&self) -> LeadId {
        self.id
    }

    /// Returns the session the lead was captured from.
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Returns the listing the buyer committed to.
    pub fn listing(&self) -> &ListingRef {
        &self.listing
    }

    /// Returns the buyer's contact details.
    pub fn contact(&self) -> &BuyerContact {
        &self.contact
    }

    /// Returns the kind of commitment.
    pub fn deal_kind(&self) -> DealKind {
        self.deal_kind
    }

    /// Returns the conversation as it stood at capture time.
    pub fn conversation_snapshot(&self) -> &[Message] {
        &self.conversation_snapshot
    }

    /// Returns when the lead was captured.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// The `System` notice appended to the session once this lead is stored.
    pub fn confirmation_message(&self) -> String {
        format!(
            "Thank you! Your {} request has been submitted. The agent will contact you shortly at {}. A confirmation has been sent to {}.",
            self.deal_kind,
            self.contact.whatsapp(),
            self.contact.email()
        )
    }
}
