//! OpenSessionHandler - opens (or rejoins) the session for a buyer and listing.

use std::sync::Arc;

use thiserror::Error;

use crate::application::autopilot::AutopilotDispatcher;
use crate::application::registry::SessionRegistry;
use crate::domain::conversation::Message;
use crate::domain::foundation::{ListingId, SessionKey};
use crate::domain::session::SessionMode;
use crate::ports::CatalogError;

/// Command to open the session for a (buyer, listing) pair.
#[derive(Debug, Clone)]
pub struct OpenSessionCommand {
    pub key: SessionKey,
}

/// Result of opening a session.
///
/// `created` is true when this call brought the session into existence;
/// rejoining an existing session returns its current transcript instead.
#[derive(Debug, Clone)]
pub struct OpenSessionResult {
    pub key: SessionKey,
    pub created: bool,
    pub mode: SessionMode,
    pub messages: Vec<Message>,
}

/// Errors opening a session.
#[derive(Debug, Error)]
pub enum OpenSessionError {
    #[error("listing not found: {0}")]
    ListingNotFound(ListingId),

    #[error("listing catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl From<CatalogError> for OpenSessionError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => OpenSessionError::ListingNotFound(id),
            CatalogError::Unavailable(msg) => OpenSessionError::CatalogUnavailable(msg),
        }
    }
}

/// Handler for opening sessions.
///
/// First contact resolves the listing, registers the session, and spawns
/// the opening-pitch dispatch; the pitch lands asynchronously, so a newly
/// created session is returned in `Initializing` with an empty transcript.
pub struct OpenSessionHandler {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<AutopilotDispatcher>,
}

impl OpenSessionHandler {
    pub fn new(registry: Arc<SessionRegistry>, dispatcher: Arc<AutopilotDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub async fn handle(
        &self,
        cmd: OpenSessionCommand,
    ) -> Result<OpenSessionResult, OpenSessionError> {
        let acquired = self.registry.get_or_create(&cmd.key).await?;

        if acquired.created {
            tracing::info!(session = %cmd.key, "session created, dispatching opening pitch");
            self.dispatcher.spawn_pitch(Arc::clone(&acquired.cell));
        }

        let session = acquired.cell.session().lock().await;
        Ok(OpenSessionResult {
            key: cmd.key,
            created: acquired.created,
            mode: session.mode(),
            messages: session.log().snapshot(),
        })
    }
}
