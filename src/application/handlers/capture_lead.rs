//! CaptureLeadHandler - persists the buyer's contact details exactly once.

use std::sync::Arc;

use thiserror::Error;

use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::{LeadId, SessionKey};
use crate::domain::lead::{BuyerContact, ContactValidation, Lead};
use crate::domain::session::{AfterCapturePolicy, SessionError, SessionMode};
use crate::ports::{LeadStore, LeadStoreError, SessionEvent, SessionEventPublisher};

/// Command carrying the capture form fields.
#[derive(Debug, Clone)]
pub struct CaptureLeadCommand {
    pub key: SessionKey,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub whatsapp: String,
}

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureLeadResult {
    pub lead_id: LeadId,
    pub confirmation: Message,
    pub mode: SessionMode,
}

/// Errors a capture attempt can surface.
///
/// `Persistence` leaves the session awaiting capture so the buyer can
/// resubmit the form; nothing was stored.
#[derive(Debug, Error)]
pub enum CaptureLeadError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionKey),

    #[error(transparent)]
    Validation(#[from] ContactValidation),

    #[error("A lead was already captured for this session")]
    AlreadyCaptured,

    #[error("Lead could not be stored: {0}")]
    Persistence(String),

    #[error(transparent)]
    Session(SessionError),
}

impl From<SessionError> for CaptureLeadError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadyCaptured => CaptureLeadError::AlreadyCaptured,
            other => CaptureLeadError::Session(other),
        }
    }
}

impl From<LeadStoreError> for CaptureLeadError {
    fn from(err: LeadStoreError) -> Self {
        CaptureLeadError::Persistence(err.to_string())
    }
}

/// Handler for the lead capture form.
///
/// The capture gate serialises attempts per session, and the store call
/// runs without the session lock so a slow CRM never blocks the chat.
/// The session's own lead marker makes the whole thing exactly-once.
pub struct CaptureLeadHandler {
    registry: Arc<SessionRegistry>,
    lead_store: Arc<dyn LeadStore>,
    events: Arc<dyn SessionEventPublisher>,
    after_capture: AfterCapturePolicy,
}

impl CaptureLeadHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        lead_store: Arc<dyn LeadStore>,
        events: Arc<dyn SessionEventPublisher>,
        after_capture: AfterCapturePolicy,
    ) -> Self {
        Self {
            registry,
            lead_store,
            events,
            after_capture,
        }
    }

    pub async fn handle(
        &self,
        cmd: CaptureLeadCommand,
    ) -> Result<CaptureLeadResult, CaptureLeadError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| CaptureLeadError::SessionNotFound(cmd.key.clone()))?;

        let contact = BuyerContact::new(
            cmd.name,
            cmd.address,
            cmd.phone,
            cmd.email,
            cmd.whatsapp,
        )?;

        // One capture attempt at a time per session.
        let _gate = cell.capture_gate().lock().await;

        let (listing, deal_kind, snapshot) = {
            let session = cell.session().lock().await;
            session.ensure_capture_allowed()?;
            let deal = session
                .deal_status()
                .ok_or_else(|| SessionError::invalid_state("capture_lead", session.mode()))?;
            (
                session.listing().clone(),
                deal.kind,
                session.log().snapshot(),
            )
        };

        let lead = Lead::new(cmd.key.clone(), listing, contact, deal_kind, snapshot);
        let confirmation_text = lead.confirmation_message();

        // Session lock released while the store runs.
        let lead_id = self.lead_store.persist(&lead).await?;

        let outcome = {
            let mut session = cell.session().lock().await;
            match session.complete_lead_capture(lead_id, &confirmation_text, self.after_capture) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        session = %cmd.key,
                        lead = %lead_id,
                        error = %err,
                        "lead stored but session no longer accepts the confirmation"
                    );
                    return Err(err.into());
                }
            }
        };

        tracing::info!(
            session = %cmd.key,
            lead = %lead_id,
            kind = %deal_kind,
            "lead captured"
        );

        self.events.publish(SessionEvent::MessageAppended {
            session: cmd.key.clone(),
            message: outcome.confirmation.clone(),
        });
        self.events.publish(SessionEvent::LeadCaptured {
            session: cmd.key.clone(),
            lead_id,
            deal_kind,
        });
        self.events.publish(SessionEvent::ModeChanged {
            session: cmd.key.clone(),
            mode: outcome.mode,
        });

        if outcome.mode == SessionMode::Closed {
            self.registry.evict(&cmd.key).await;
        }

        Ok(CaptureLeadResult {
            lead_id,
            confirmation: outcome.confirmation,
            mode: outcome.mode,
        })
    }
}
