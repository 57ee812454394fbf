//! CancelLeadCaptureHandler - abandons the capture form and resumes the chat.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::foundation::SessionKey;
use crate::domain::session::SessionMode;
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

#[derive(Debug, Clone)]
pub struct CancelLeadCaptureCommand {
    pub key: SessionKey,
}

#[derive(Debug, Clone)]
pub struct CancelLeadCaptureResult {
    pub mode: SessionMode,
}

/// Handler for backing out of lead capture.
///
/// Clears the recorded deal so the classifier can raise it again later.
pub struct CancelLeadCaptureHandler {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn SessionEventPublisher>,
}

impl CancelLeadCaptureHandler {
    pub fn new(registry: Arc<SessionRegistry>, events: Arc<dyn SessionEventPublisher>) -> Self {
        Self { registry, events }
    }

    pub async fn handle(
        &self,
        cmd: CancelLeadCaptureCommand,
    ) -> Result<CancelLeadCaptureResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let mode = {
            let mut session = cell.session().lock().await;
            session.cancel_lead_capture()?
        };

        tracing::info!(session = %cmd.key, ?mode, "lead capture cancelled");
        self.events.publish(SessionEvent::ModeChanged {
            session: cmd.key,
            mode,
        });

        Ok(CancelLeadCaptureResult { mode })
    }
}
