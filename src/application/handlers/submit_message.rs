//! SubmitMessageHandler - appends a buyer turn and dispatches the autopilot reply.

use std::sync::Arc;

use crate::application::autopilot::AutopilotDispatcher;
use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::SessionKey;
use crate::ports::{SessionEvent, SessionEventPublisher};

use super::SessionCommandError;

/// Command carrying one buyer message.
#[derive(Debug, Clone)]
pub struct SubmitMessageCommand {
    pub key: SessionKey,
    pub text: String,
}

/// Result of a buyer submission.
///
/// The buyer's message is already in the log; when `reply_pending` is true
/// an autopilot reply will arrive through the event stream.
#[derive(Debug, Clone)]
pub struct SubmitMessageResult {
    pub message: Message,
    pub reply_pending: bool,
}

/// Handler for buyer message submissions.
///
/// The append happens under the session lock; the inference dispatch runs
/// on its own task so a slow provider never blocks the submitting request.
pub struct SubmitMessageHandler {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<AutopilotDispatcher>,
    events: Arc<dyn SessionEventPublisher>,
}

impl SubmitMessageHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        dispatcher: Arc<AutopilotDispatcher>,
        events: Arc<dyn SessionEventPublisher>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            events,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitMessageCommand,
    ) -> Result<SubmitMessageResult, SessionCommandError> {
        let cell = self
            .registry
            .get(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        let outcome = {
            let mut session = cell.session().lock().await;
            session.submit_buyer_message(&cmd.text)?
        };

        self.events.publish(SessionEvent::MessageAppended {
            session: cmd.key.clone(),
            message: outcome.message.clone(),
        });

        let reply_pending = match outcome.dispatch {
            Some(tag) => {
                tracing::debug!(session = %cmd.key, %tag, "buyer turn dispatched");
                self.dispatcher.spawn_reply(Arc::clone(&cell), tag);
                true
            }
            None => false,
        };

        Ok(SubmitMessageResult {
            message: outcome.message,
            reply_pending,
        })
    }
}
