//! Integration tests for the deal-closing session flow.
//!
//! These tests drive the application handlers end to end over the in-memory
//! adapters, the same wiring the server uses when no external services are
//! configured:
//! 1. Opening a session resolves the listing and dispatches the opening pitch
//! 2. Buyer turns produce autopilot replies with deal-signal classification
//! 3. Human takeover invalidates autopilot work still in flight
//! 4. Qualifying deal signals funnel into exactly-once lead capture
//! 5. Session events fan out to subscribers in order until the session closes

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use dealdesk::adapters::catalog::InMemoryCatalog;
use dealdesk::adapters::events::BroadcastHub;
use dealdesk::adapters::inference::MockInferenceClient;
use dealdesk::adapters::lead_store::InMemoryLeadStore;
use dealdesk::application::handlers::{
    CancelLeadCaptureCommand, CancelLeadCaptureHandler, CaptureLeadCommand, CaptureLeadError,
    CaptureLeadHandler, CaptureLeadResult, CloseSessionCommand, CloseSessionHandler,
    GetTranscriptHandler, GetTranscriptQuery, MarkDealCommand, MarkDealHandler,
    OpenSessionCommand, OpenSessionHandler, OpenSessionResult, PostAgentMessageCommand,
    PostAgentMessageHandler, ReleaseControlCommand, ReleaseControlHandler, SessionCommandError,
    SubmitMessageCommand, SubmitMessageHandler, SubmitMessageResult, TakeOverCommand,
    TakeOverHandler, TranscriptView,
};
use dealdesk::application::{AutopilotDispatcher, DispatchSettings, SessionRegistry};
use dealdesk::domain::conversation::Sender;
use dealdesk::domain::foundation::{AgentId, BuyerId, ListingId, SessionKey};
use dealdesk::domain::listing::ListingRef;
use dealdesk::domain::session::{AfterCapturePolicy, DealKind, DealSignal, SessionMode};
use dealdesk::ports::{LeadStore, SessionEvent, SessionEventPublisher};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn listing() -> ListingRef {
    ListingRef::new(
        ListingId::new("villa-12").unwrap(),
        "Villa Aurora",
        "Cascais",
        850_000.0,
        "Four bedrooms, ocean view, five minutes from the beach.",
    )
    .unwrap()
}

fn key() -> SessionKey {
    SessionKey::new(
        BuyerId::new("buyer-1").unwrap(),
        ListingId::new("villa-12").unwrap(),
    )
}

fn contact_form() -> CaptureLeadCommand {
    CaptureLeadCommand {
        key: key(),
        name: "Ada Buyer".to_string(),
        address: "12 Hill Road, Lisbon".to_string(),
        phone: "+351 21 123 4567".to_string(),
        email: "ada@example.com".to_string(),
        whatsapp: "+351 91 123 4567".to_string(),
    }
}

/// The application wired over in-memory adapters, handlers built on demand
/// the same way the HTTP state does it.
struct App {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<AutopilotDispatcher>,
    events: Arc<dyn SessionEventPublisher>,
    hub: Arc<BroadcastHub>,
    store: Arc<InMemoryLeadStore>,
}

impl App {
    fn new(inference: MockInferenceClient) -> Self {
        let catalog = Arc::new(InMemoryCatalog::with_listings(vec![listing()]));
        let hub = Arc::new(BroadcastHub::with_default_capacity());
        let events: Arc<dyn SessionEventPublisher> = hub.clone();
        let registry = Arc::new(SessionRegistry::new(catalog, Arc::clone(&events)));
        let dispatcher = Arc::new(AutopilotDispatcher::new(
            Arc::new(inference),
            Arc::clone(&events),
            DispatchSettings::default(),
        ));

        Self {
            registry,
            dispatcher,
            events,
            hub,
            store: Arc::new(InMemoryLeadStore::new()),
        }
    }

    async fn open(&self) -> OpenSessionResult {
        OpenSessionHandler::new(Arc::clone(&self.registry), Arc::clone(&self.dispatcher))
            .handle(OpenSessionCommand { key: key() })
            .await
            .unwrap()
    }

    async fn submit(&self, text: &str) -> SubmitMessageResult {
        SubmitMessageHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.events),
        )
        .handle(SubmitMessageCommand {
            key: key(),
            text: text.to_string(),
        })
        .await
        .unwrap()
    }

    async fn take_over(&self, agent: &str, name: &str) {
        TakeOverHandler::new(Arc::clone(&self.registry), Arc::clone(&self.events))
            .handle(TakeOverCommand {
                key: key(),
                agent: AgentId::new(agent).unwrap(),
                agent_name: name.to_string(),
            })
            .await
            .unwrap();
    }

    async fn release(&self) -> SessionMode {
        ReleaseControlHandler::new(Arc::clone(&self.registry), Arc::clone(&self.events))
            .handle(ReleaseControlCommand { key: key() })
            .await
            .unwrap()
            .mode
    }

    async fn post_agent_message(&self, text: &str) {
        PostAgentMessageHandler::new(Arc::clone(&self.registry), Arc::clone(&self.events))
            .handle(PostAgentMessageCommand {
                key: key(),
                text: text.to_string(),
            })
            .await
            .unwrap();
    }

    async fn mark_deal(&self, kind: DealKind) -> SessionMode {
        MarkDealHandler::new(Arc::clone(&self.registry), Arc::clone(&self.events))
            .handle(MarkDealCommand { key: key(), kind })
            .await
            .unwrap()
            .mode
    }

    async fn cancel_capture(&self) -> SessionMode {
        CancelLeadCaptureHandler::new(Arc::clone(&self.registry), Arc::clone(&self.events))
            .handle(CancelLeadCaptureCommand { key: key() })
            .await
            .unwrap()
            .mode
    }

    fn capture_handler(&self) -> CaptureLeadHandler {
        CaptureLeadHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.store) as Arc<dyn LeadStore>,
            Arc::clone(&self.events),
            AfterCapturePolicy::Resume,
        )
    }

    async fn capture(&self) -> Result<CaptureLeadResult, CaptureLeadError> {
        self.capture_handler().handle(contact_form()).await
    }

    async fn close(&self) {
        CloseSessionHandler::new(Arc::clone(&self.registry))
            .handle(CloseSessionCommand { key: key() })
            .await
            .unwrap();
    }

    async fn try_transcript(&self) -> Result<TranscriptView, SessionCommandError> {
        GetTranscriptHandler::new(Arc::clone(&self.registry))
            .handle(GetTranscriptQuery { key: key() })
            .await
    }

    async fn transcript(&self) -> TranscriptView {
        self.try_transcript().await.unwrap()
    }

    /// Polls the read model until the session reaches `target`.
    async fn wait_for_mode(&self, target: SessionMode) {
        for _ in 0..300 {
            if let Ok(view) = self.try_transcript().await {
                if view.mode == target {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {}", target);
    }

    /// Polls the read model until the transcript holds `count` messages.
    async fn wait_for_message_count(&self, count: usize) {
        for _ in 0..300 {
            if let Ok(view) = self.try_transcript().await {
                if view.messages.len() >= count {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("transcript never reached {} messages", count);
    }
}

fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[SessionEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            SessionEvent::MessageAppended { .. } => "message",
            SessionEvent::ModeChanged { .. } => "mode",
            SessionEvent::LeadCaptured { .. } => "lead",
            SessionEvent::SessionClosed { .. } => "closed",
        })
        .collect()
}

// =============================================================================
// Integration Tests
// =============================================================================

/// Walks the whole happy path: open, pitch, buyer turn, qualifying signal,
/// lead capture, resume. Checks the transcript, the stored lead, and the
/// event stream a WebSocket subscriber would have seen.
#[tokio::test]
async fn buyer_journey_from_pitch_to_captured_lead() {
    let app = App::new(
        MockInferenceClient::new()
            .with_pitch("Step right into Villa Aurora - shall I show you around?")
            .with_reply("Shall I pencil you in for a viewing on Saturday?")
            .with_signal(DealSignal::detected(DealKind::Viewing, 0.9)),
    );
    let mut rx = app.hub.subscribe(&key());

    let opened = app.open().await;
    assert!(opened.created);
    assert_eq!(opened.mode, SessionMode::Initializing);
    assert!(opened.messages.is_empty());

    app.wait_for_mode(SessionMode::Autopilot).await;
    let view = app.transcript().await;
    assert_eq!(view.listing_title, "Villa Aurora");
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].sender(), Sender::AutopilotAgent);

    let submitted = app.submit("I want to see it this weekend").await;
    assert!(submitted.reply_pending);

    app.wait_for_mode(SessionMode::AwaitingLeadCapture).await;
    let view = app.transcript().await;
    assert_eq!(view.messages.len(), 3);
    assert_eq!(view.deal.unwrap().kind, DealKind::Viewing);
    assert!(view.lead_id.is_none());

    let captured = app.capture().await.unwrap();
    assert_eq!(captured.mode, SessionMode::Autopilot);
    assert!(captured.confirmation.text().contains("viewing request"));
    assert!(captured.confirmation.text().contains("ada@example.com"));

    let view = app.transcript().await;
    assert_eq!(view.lead_id, Some(captured.lead_id));
    assert_eq!(
        view.messages.last().unwrap().text(),
        captured.confirmation.text()
    );

    let stored = app.store.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id(), captured.lead_id);
    assert_eq!(stored[0].deal_kind(), DealKind::Viewing);
    assert_eq!(stored[0].listing().title(), "Villa Aurora");
    assert!(!stored[0].conversation_snapshot().is_empty());

    // Rejoining afterwards returns the existing transcript.
    let rejoined = app.open().await;
    assert!(!rejoined.created);
    assert_eq!(rejoined.messages.len(), 4);

    // The subscriber saw every step, in order.
    let events = drain(&mut rx);
    assert_eq!(
        kinds(&events),
        vec!["message", "mode", "message", "message", "mode", "message", "lead", "mode"]
    );
    assert!(matches!(
        events[4],
        SessionEvent::ModeChanged {
            mode: SessionMode::AwaitingLeadCapture,
            ..
        }
    ));
    assert!(matches!(
        events[6],
        SessionEvent::LeadCaptured {
            deal_kind: DealKind::Viewing,
            ..
        }
    ));
    assert!(matches!(
        events[7],
        SessionEvent::ModeChanged {
            mode: SessionMode::Autopilot,
            ..
        }
    ));
}

/// A human takeover while the provider is still generating must win: the
/// autopilot reply never reaches the chat and the agent speaks instead.
#[tokio::test]
async fn takeover_mid_flight_keeps_the_robot_reply_out_of_the_chat() {
    let app = App::new(
        MockInferenceClient::new()
            .with_pitch("Welcome to Villa Aurora.")
            .with_reply("robot reply")
            .with_delay(Duration::from_millis(300)),
    );

    app.open().await;
    app.wait_for_mode(SessionMode::Autopilot).await;

    let submitted = app.submit("Is the garden big?").await;
    assert!(submitted.reply_pending);

    // Lands while the provider call for the reply is still sleeping.
    app.take_over("agent-9", "Dana").await;

    // Give the superseded dispatch ample time to finish and be discarded.
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let view = app.transcript().await;
    assert_eq!(view.mode, SessionMode::HumanControlled);
    let texts: Vec<&str> = view.messages.iter().map(|m| m.text()).collect();
    assert!(!texts.contains(&"robot reply"));
    assert_eq!(*texts.last().unwrap(), "Dana has joined the chat.");

    app.post_agent_message("Dana here - happy to walk you through the garden myself.")
        .await;

    // Buyer turns under human control get no autopilot dispatch.
    let submitted = app.submit("Great, when can we meet?").await;
    assert!(!submitted.reply_pending);

    let view = app.transcript().await;
    assert_eq!(view.messages.last().unwrap().sender(), Sender::Buyer);
    assert_eq!(view.messages.len(), 5);
}

/// Two capture submissions racing each other settle to exactly one stored
/// lead; the loser is told a lead already exists.
#[tokio::test]
async fn concurrent_capture_attempts_store_exactly_one_lead() {
    let app = App::new(MockInferenceClient::new().with_pitch("Welcome."));

    app.open().await;
    app.wait_for_mode(SessionMode::Autopilot).await;
    app.take_over("agent-9", "Dana").await;
    assert_eq!(app.mark_deal(DealKind::Purchase).await, SessionMode::AwaitingLeadCapture);

    let handler = app.capture_handler();
    let (first, second) = tokio::join!(
        handler.handle(contact_form()),
        handler.handle(contact_form())
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CaptureLeadError::AlreadyCaptured))));

    assert_eq!(app.store.len(), 1);
    assert_eq!(app.store.all()[0].deal_kind(), DealKind::Purchase);

    let view = app.transcript().await;
    assert!(view.lead_id.is_some());
    assert_eq!(view.mode, SessionMode::HumanControlled);
}

/// Closing tears the event stream down after delivering the closure, and
/// the next contact on the same key starts from a clean slate.
#[tokio::test]
async fn closed_session_ends_the_event_stream_and_reopens_fresh() {
    let app = App::new(
        MockInferenceClient::new()
            .with_pitch("First visit: welcome to Villa Aurora.")
            .with_reply("Of course, the kitchen was redone last year.")
            .with_pitch("Second visit: welcome back to Villa Aurora."),
    );
    let mut rx = app.hub.subscribe(&key());

    app.open().await;
    app.wait_for_mode(SessionMode::Autopilot).await;
    app.submit("Tell me about the kitchen").await;
    app.wait_for_message_count(3).await;

    app.close().await;

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::SessionClosed { .. })
    ));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Closed)));
    assert!(matches!(
        app.try_transcript().await,
        Err(SessionCommandError::SessionNotFound(_))
    ));

    // Same key, brand-new session.
    let reopened = app.open().await;
    assert!(reopened.created);
    app.wait_for_mode(SessionMode::Autopilot).await;

    let view = app.transcript().await;
    assert_eq!(view.messages.len(), 1);
    assert_eq!(
        view.messages[0].text(),
        "Second visit: welcome back to Villa Aurora."
    );
    assert!(view.deal.is_none());
    assert!(view.lead_id.is_none());
}

/// After the agent releases control the autopilot answers buyer turns again.
#[tokio::test]
async fn release_hands_the_conversation_back_to_the_autopilot() {
    let app = App::new(
        MockInferenceClient::new()
            .with_pitch("Welcome to Villa Aurora.")
            .with_reply("How about 10am? I will reserve it now."),
    );

    app.open().await;
    app.wait_for_mode(SessionMode::Autopilot).await;
    app.take_over("agent-9", "Dana").await;
    app.post_agent_message("I can offer a private tour on Friday.")
        .await;

    assert_eq!(app.release().await, SessionMode::Autopilot);

    let submitted = app.submit("Friday works, what time?").await;
    assert!(submitted.reply_pending);
    app.wait_for_message_count(5).await;

    let view = app.transcript().await;
    let last = view.messages.last().unwrap();
    assert_eq!(last.sender(), Sender::AutopilotAgent);
    assert_eq!(last.text(), "How about 10am? I will reserve it now.");
}

/// An agent can back out of lead capture and raise it again with a different
/// deal kind; only the final capture is stored.
#[tokio::test]
async fn agent_can_cancel_and_remark_the_deal_before_capture() {
    let app = App::new(MockInferenceClient::new().with_pitch("Welcome."));

    app.open().await;
    app.wait_for_mode(SessionMode::Autopilot).await;
    app.take_over("agent-9", "Dana").await;

    assert_eq!(app.mark_deal(DealKind::Rental).await, SessionMode::AwaitingLeadCapture);
    assert_eq!(app.transcript().await.deal.unwrap().kind, DealKind::Rental);

    // Back out: control returns to the agent and the deal is cleared.
    assert_eq!(app.cancel_capture().await, SessionMode::HumanControlled);
    assert!(app.transcript().await.deal.is_none());
    assert!(app.store.is_empty());

    assert_eq!(app.mark_deal(DealKind::Purchase).await, SessionMode::AwaitingLeadCapture);
    let captured = app.capture().await.unwrap();

    assert_eq!(captured.mode, SessionMode::HumanControlled);
    assert!(captured.confirmation.text().contains("purchase request"));
    assert_eq!(app.store.len(), 1);
    assert_eq!(app.store.all()[0].deal_kind(), DealKind::Purchase);
}
