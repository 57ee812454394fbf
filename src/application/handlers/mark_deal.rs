//! MarkDealHandler - lets the controlling agent flag a closed deal by hand.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::foundation::SessionKey;
use crate::domain::session::{DealKind, SessionMode};
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

#[derive(Debug, Clone)]
pub struct MarkDealCommand {
    pub key: SessionKey,
    pub kind: DealKind,
}

#[derive(Debug, Clone)]
pub struct MarkDealResult {
    pub mode: SessionMode,
}

/// Handler for an agent's manual deal mark.
///
/// Counterpart to the classifier path: a human in control can move the
/// session to lead capture without any model involvement.
pub struct MarkDealHandler {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn SessionEventPublisher>,
}

impl MarkDealHandler {
    pub fn new(registry: Arc<SessionRegistry>, events: Arc<dyn SessionEventPublisher>) -> Self {
        Self { registry, events }
    }

    pub async fn handle(&self, cmd: MarkDealCommand) -> Result<MarkDealResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let mode = {
            let mut session = cell.session().lock().await;
            session.mark_deal(cmd.kind)?;
            session.mode()
        };

        tracing::info!(session = %cmd.key, kind = %cmd.kind, "deal marked by agent");
        self.events.publish(SessionEvent::ModeChanged {
            session: cmd.key,
            mode,
        });

        Ok(MarkDealResult { mode })
    }
}
