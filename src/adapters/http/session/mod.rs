//! HTTP adapter for deal-closing session endpoints.

mod dto;
mod handlers;
mod routes;
mod ws_handler;

pub use dto::{
    AgentMessageRequest, CaptureLeadRequest, ErrorResponse, LeadCapturedResponse,
    MarkDealRequest, MessageAcceptedResponse, MessageResponse, ModeResponse, OpenSessionRequest,
    SessionCommandResponse, SessionListResponse, SessionOpenedResponse, SessionSummaryResponse,
    SubmitMessageRequest, TakeOverRequest, TakeOverResponse, TranscriptResponse,
};
pub use handlers::SessionAppState;
pub use routes::session_routes;
