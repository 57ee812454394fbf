//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

use thiserror::Error;

use crate::domain::foundation::SessionKey;
use crate::domain::session::SessionError;

mod cancel_lead_capture;
mod capture_lead;
mod close_session;
mod get_transcript;
mod list_sessions;
mod mark_deal;
mod open_session;
mod post_agent_message;
mod release_control;
mod submit_message;
mod take_over;

pub use cancel_lead_capture::{
    CancelLeadCaptureCommand, CancelLeadCaptureHandler, CancelLeadCaptureResult,
};
pub use capture_lead::{CaptureLeadCommand, CaptureLeadError, CaptureLeadHandler, CaptureLeadResult};
pub use close_session::{CloseSessionCommand, CloseSessionHandler};
pub use get_transcript::{GetTranscriptHandler, GetTranscriptQuery, TranscriptView};
pub use list_sessions::{ListSessionsHandler, SessionSummary};
pub use mark_deal::{MarkDealCommand, MarkDealHandler, MarkDealResult};
pub use open_session::{OpenSessionCommand, OpenSessionError, OpenSessionHandler, OpenSessionResult};
pub use post_agent_message::{
    PostAgentMessageCommand, PostAgentMessageHandler, PostAgentMessageResult,
};
pub use release_control::{ReleaseControlCommand, ReleaseControlHandler, ReleaseControlResult};
pub use submit_message::{SubmitMessageCommand, SubmitMessageHandler, SubmitMessageResult};
pub use take_over::{TakeOverCommand, TakeOverHandler, TakeOverResult};

/// Failure shared by commands addressed to one live session.
#[derive(Debug, Error)]
pub enum SessionCommandError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionKey),

    #[error(transparent)]
    Session(#[from] SessionError),
}
