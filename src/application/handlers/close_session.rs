//! CloseSessionHandler - removes a session from the registry for good.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::foundation::SessionKey;

use super::SessionCommandError;

#[derive(Debug, Clone)]
pub struct CloseSessionCommand {
    pub key: SessionKey,
}

/// Handler for explicit session close.
///
/// Eviction publishes the `SessionClosed` event and drops the cell; a
/// later contact on the same key starts a fresh session.
pub struct CloseSessionHandler {
    registry: Arc<SessionRegistry>,
}

impl CloseSessionHandler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, cmd: CloseSessionCommand) -> Result<(), SessionCommandError> {
        self.registry
            .evict(&cmd.key)
            .await
            .ok_or_else(|| SessionCommandError::SessionNotFound(cmd.key.clone()))?;

        tracing::info!(session = %cmd.key, "session closed");
        Ok(())
    }
}
