//! GetTranscriptHandler - query handler for one session's full state.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::{LeadId, SessionKey};
use crate::domain::session::{DealStatus, SessionMode};

use super::SessionCommandError;

/// Query for a session transcript.
#[derive(Debug, Clone)]
pub struct GetTranscriptQuery {
    pub key: SessionKey,
}

/// Read model of a live session, as rendered to the chat surface.
#[derive(Debug, Clone)]
pub struct TranscriptView {
    pub key: SessionKey,
    pub mode: SessionMode,
    pub listing_title: String,
    pub messages: Vec<Message>,
    pub deal: Option<DealStatus>,
    pub lead_id: Option<LeadId>,
}

/// Handler for transcript reads.
pub struct GetTranscriptHandler {
    registry: Arc<SessionRegistry>,
}

impl GetTranscriptHandler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(
        &self,
        query: GetTranscriptQuery,
    ) -> Result<TranscriptView, SessionCommandError> {
        let cell = self
            .registry
            .get(&query.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(query.key.clone()))?;

        let session = cell.session().lock().await;
        Ok(TranscriptView {
            key: query.key,
            mode: session.mode(),
            listing_title: session.listing().title().to_string(),
            messages: session.log().snapshot(),
            deal: session.deal_status(),
            lead_id: session.lead_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::adapters::catalog::InMemoryCatalog;
    use crate::domain::conversation::Sender;
    use crate::domain::foundation::{AgentId, BuyerId, ListingId};
    use crate::domain::listing::ListingRef;
    use crate::domain::session::DealKind;
    use crate::ports::{SessionEvent, SessionEventPublisher};

    #[derive(Default)]
    struct CollectingEvents {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl SessionEventPublisher for CollectingEvents {
        fn publish(&self, event: SessionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn test_key() -> SessionKey {
        SessionKey::new(
            BuyerId::new("buyer-1").unwrap(),
            ListingId::new("listing-1").unwrap(),
        )
    }

    fn test_listing() -> ListingRef {
        ListingRef::new(
            ListingId::new("listing-1").unwrap(),
            "Sunset Villa",
            "Lakeview",
            450_000.0,
            "Three bedrooms by the lake.",
        )
        .unwrap()
    }

    async fn fixture() -> (GetTranscriptHandler, Arc<SessionRegistry>) {
        let catalog = Arc::new(InMemoryCatalog::with_listings(vec![test_listing()]));
        let events = Arc::new(CollectingEvents::default());
        let registry = Arc::new(SessionRegistry::new(
            catalog,
            events as Arc<dyn SessionEventPublisher>,
        ));

        let acquired = registry.get_or_create(&test_key()).await.unwrap();
        {
            let mut session = acquired.cell.session().lock().await;
            session.open_with_pitch("Welcome to Sunset Villa.").unwrap();
            session.submit_buyer_message("Is it still available?").unwrap();
        }

        (GetTranscriptHandler::new(Arc::clone(&registry)), registry)
    }

    #[tokio::test]
    async fn returns_the_transcript_in_order() {
        let (handler, _registry) = fixture().await;

        let view = handler
            .handle(GetTranscriptQuery { key: test_key() })
            .await
            .unwrap();

        assert_eq!(view.listing_title, "Sunset Villa");
        assert_eq!(view.messages.len(), 2);
        assert_eq!(view.messages[0].sender(), Sender::AutopilotAgent);
        assert_eq!(view.messages[1].text(), "Is it still available?");
        assert!(view.deal.is_none());
        assert!(view.lead_id.is_none());
    }

    #[tokio::test]
    async fn includes_deal_status_once_marked() {
        let (handler, registry) = fixture().await;
        {
            let cell = registry.get(&test_key()).await.unwrap();
            let mut session = cell.session().lock().await;
            session
                .take_over(AgentId::new("agent-9").unwrap(), "Dana")
                .unwrap();
            session.mark_deal(DealKind::Viewing).unwrap();
        }

        let view = handler
            .handle(GetTranscriptQuery { key: test_key() })
            .await
            .unwrap();

        assert_eq!(view.mode, SessionMode::AwaitingLeadCapture);
        assert_eq!(view.deal.unwrap().kind, DealKind::Viewing);
    }

    #[tokio::test]
    async fn unknown_session_fails() {
        let (handler, _registry) = fixture().await;

        let result = handler
            .handle(GetTranscriptQuery {
                key: SessionKey::new(
                    BuyerId::new("buyer-2").unwrap(),
                    ListingId::new("listing-1").unwrap(),
                ),
            })
            .await;

        assert!(matches!(
            result,
            Err(SessionCommandError::SessionNotFound(_))
        ));
    }
}
