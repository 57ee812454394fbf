//! Session event port - Fan-out of session activity to live viewers.
//!
//! Every durable change to a session (a message landing in the log, a mode
//! transition, a captured lead, closure) is announced through this port so
//! connected buyer and agent views can render it as it happens. Delivery is
//! best-effort: events are notifications, not the system of record, and a
//! publisher with no listeners simply drops them.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::Message;
use crate::domain::foundation::{LeadId, SessionKey};
use crate::domain::session::{DealKind, SessionMode};

/// A notification about session activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was appended to the session log.
    MessageAppended {
        /// Session the message belongs to.
        session: SessionKey,
        /// The appended message.
        message: Message,
    },

    /// The session moved to a new mode.
    ModeChanged {
        /// Session that transitioned.
        session: SessionKey,
        /// Mode it is now in.
        mode: SessionMode,
    },

    /// A lead was captured and persisted for the session.
    LeadCaptured {
        /// Session the lead came from.
        session: SessionKey,
        /// Id of the persisted lead.
        lead_id: LeadId,
        /// Kind of deal the lead commits to.
        deal_kind: DealKind,
    },

    /// The session was closed.
    SessionClosed {
        /// Session that closed.
        session: SessionKey,
    },
}

impl SessionEvent {
    /// Returns the session this event belongs to.
    pub fn session(&self) -> &SessionKey {
        match self {
            Self::MessageAppended { session, .. }
            | Self::ModeChanged { session, .. }
            | Self::LeadCaptured { session, .. }
            | Self::SessionClosed { session } => session,
        }
    }
}

/// Port for publishing session events to live subscribers.
///
/// Publishing never blocks and never fails from the caller's point of view;
/// implementations decide how to fan out and what to do about slow readers.
pub trait SessionEventPublisher: Send + Sync {
    /// Publishes an event to whoever is watching the session.
    fn publish(&self, event: SessionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{BuyerId, ListingId};

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SessionEventPublisher) {}

    // Compile-time check that trait is Send + Sync
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn publisher_is_send_sync() {
        assert_send_sync::<Box<dyn SessionEventPublisher>>();
    }

    fn test_key() -> SessionKey {
        SessionKey::new(
            BuyerId::new("buyer-1").unwrap(),
            ListingId::new("listing-1").unwrap(),
        )
    }

    #[test]
    fn events_tag_their_variant_in_json() {
        let event = SessionEvent::SessionClosed { session: test_key() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_closed");
        assert_eq!(json["session"]["buyer"], "buyer-1");
    }

    #[test]
    fn every_variant_reports_its_session() {
        let key = test_key();
        let event = SessionEvent::ModeChanged {
            session: key.clone(),
            mode: SessionMode::Autopilot,
        };
        assert_eq!(event.session(), &key);
    }
}
