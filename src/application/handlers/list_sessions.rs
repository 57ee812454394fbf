//! ListSessionsHandler - query handler for the agent dashboard's session list.

use std::sync::Arc;

use crate::application::registry::SessionRegistry;
use crate::domain::foundation::{SessionKey, Timestamp};
use crate::domain::session::{DealStatus, SessionMode};

/// One row in the dashboard's session list.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub key: SessionKey,
    pub mode: SessionMode,
    pub listing_title: String,
    pub message_count: usize,
    pub deal: Option<DealStatus>,
    pub last_activity: Timestamp,
}

/// Handler listing every live session, most recently active first.
pub struct ListSessionsHandler {
    registry: Arc<SessionRegistry>,
}

impl ListSessionsHandler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self) -> Vec<SessionSummary> {
        let cells = self.registry.all().await;
        let mut summaries = Vec::with_capacity(cells.len());
        for cell in cells {
            let session = cell.session().lock().await;
            summaries.push(SessionSummary {
                key: session.key().clone(),
                mode: session.mode(),
                listing_title: session.listing().title().to_string(),
                message_count: session.log().len(),
                deal: session.deal_status(),
                last_activity: *session.last_activity(),
            });
        }
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }
}
