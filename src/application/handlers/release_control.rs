//! ReleaseControlHandler - hands a human-controlled session back to autopilot.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::foundation::SessionKey;
use crate::domain::session::SessionMode;
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

#[derive(Debug, Clone)]
pub struct ReleaseControlCommand {
    pub key: SessionKey,
}

#[derive(Debug, Clone)]
pub struct ReleaseControlResult {
    pub mode: SessionMode,
}

/// Handler for returning control to the autopilot.
pub struct ReleaseControlHandler {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn SessionEventPublisher>,
}

impl ReleaseControlHandler {
    pub fn new(registry: Arc<SessionRegistry>, events: Arc<dyn SessionEventPublisher>) -> Self {
        Self { registry, events }
    }

    pub async fn handle(
        &self,
        cmd: ReleaseControlCommand,
    ) -> Result<ReleaseControlResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let mode = {
            let mut session = cell.session().lock().await;
            session.release_control()?;
            session.mode()
        };

        tracing::info!(session = %cmd.key, "control released back to autopilot");
        self.events.publish(SessionEvent::ModeChanged {
            session: cmd.key,
            mode,
        });

        Ok(ReleaseControlResult { mode })
    }
}
