//! PostAgentMessageHandler - appends a reply typed by the controlling agent.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::SessionKey;
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

#[derive(Debug, Clone)]
pub struct PostAgentMessageCommand {
    pub key: SessionKey,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PostAgentMessageResult {
    pub message: Message,
}

/// Handler for human-agent replies.
///
/// Only valid while the session is human controlled; the aggregate
/// rejects it in any other mode.
pub struct PostAgentMessageHandler {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn SessionEventPublisher>,
}

impl PostAgentMessageHandler {
    pub fn new(registry: Arc<SessionRegistry>, events: Arc<dyn SessionEventPublisher>) -> Self {
        Self { registry, events }
    }

    pub async fn handle(
        &self,
        cmd: PostAgentMessageCommand,
    ) -> Result<PostAgentMessageResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let message = {
            let mut session = cell.session().lock().await;
            session.post_agent_message(&cmd.text)?
        };

        self.events.publish(SessionEvent::MessageAppended {
            session: cmd.key,
            message: message.clone(),
        });

        Ok(PostAgentMessageResult { message })
    }
}
