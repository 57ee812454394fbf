//! TakeOverHandler - moves a session from autopilot to human control.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::{AgentId, SessionKey};
use crate::domain::session::SessionMode;
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

/// Command to put a named agent in control of a session.
#[derive(Debug, Clone)]
pub struct TakeOverCommand {
    pub key: SessionKey,
    pub agent: AgentId,
    pub agent_name: String,
}

/// Result of a takeover: the join announcement and the new mode.
#[derive(Debug, Clone)]
pub struct TakeOverResult {
    pub message: Message,
    pub mode: SessionMode,
}

/// Handler for human takeover.
///
/// The epoch bump inside the aggregate invalidates any autopilot reply
/// still in flight; nothing here has to chase the task down.
pub struct TakeOverHandler {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn SessionEventPublisher>,
}

impl TakeOverHandler {
    pub fn new(registry: Arc<SessionRegistry>, events: Arc<dyn SessionEventPublisher>) -> Self {
        Self { registry, events }
    }

    pub async fn handle(&self, cmd: TakeOverCommand) -> Result<TakeOverResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let (message, mode) = {
            let mut session = cell.session().lock().await;
            let message = session.take_over(cmd.agent.clone(), &cmd.agent_name)?;
            (message, session.mode())
        };

        tracing::info!(
            session = %cmd.key,
            agent = %cmd.agent,
            "human agent took control"
        );

        self.events.publish(SessionEvent::MessageAppended {
            session: cmd.key.clone(),
            message: message.clone(),
        });
        self.events.publish(SessionEvent::ModeChanged {
            session: cmd.key,
            mode,
        });

        Ok(TakeOverResult { message, mode })
    }
}
