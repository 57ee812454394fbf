//! HTTP handlers for session endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::events::BroadcastHub;
use crate::application::handlers::{
    CancelLeadCaptureCommand, CancelLeadCaptureHandler, CaptureLeadCommand, CaptureLeadError,
    CaptureLeadHandler, CloseSessionCommand, CloseSessionHandler, GetTranscriptHandler,
    GetTranscriptQuery, ListSessionsHandler, MarkDealCommand, MarkDealHandler, OpenSessionCommand,
    OpenSessionError, OpenSessionHandler, PostAgentMessageCommand, PostAgentMessageHandler,
    ReleaseControlCommand, ReleaseControlHandler, SessionCommandError, SubmitMessageCommand,
    SubmitMessageHandler, TakeOverCommand, TakeOverHandler,
};
use crate::application::{AutopilotDispatcher, SessionRegistry};
use crate::domain::foundation::{AgentId, BuyerId, ListingId, SessionKey};
use crate::domain::session::{AfterCapturePolicy, SessionError};
use crate::ports::{LeadStore, SessionEventPublisher};

use super::dto::{
    AgentMessageRequest, CaptureLeadRequest, ErrorResponse, LeadCapturedResponse, MarkDealRequest,
    MessageAcceptedResponse, MessageResponse, ModeResponse, OpenSessionRequest,
    SessionCommandResponse, SessionListResponse, SessionOpenedResponse, SubmitMessageRequest,
    TakeOverRequest, TakeOverResponse, TranscriptResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Shared application state for the session API.
///
/// Cloned per request; holds Arc-wrapped collaborators and constructs the
/// application handlers on demand.
#[derive(Clone)]
pub struct SessionAppState {
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<AutopilotDispatcher>,
    pub lead_store: Arc<dyn LeadStore>,
    pub events: Arc<dyn SessionEventPublisher>,
    pub hub: Arc<BroadcastHub>,
    pub after_capture: AfterCapturePolicy,
}

impl SessionAppState {
    pub fn open_session_handler(&self) -> OpenSessionHandler {
        OpenSessionHandler::new(self.registry.clone(), self.dispatcher.clone())
    }

    pub fn submit_message_handler(&self) -> SubmitMessageHandler {
        SubmitMessageHandler::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            self.events.clone(),
        )
    }

    pub fn take_over_handler(&self) -> TakeOverHandler {
        TakeOverHandler::new(self.registry.clone(), self.events.clone())
    }

    pub fn release_control_handler(&self) -> ReleaseControlHandler {
        ReleaseControlHandler::new(self.registry.clone(), self.events.clone())
    }

    pub fn post_agent_message_handler(&self) -> PostAgentMessageHandler {
        PostAgentMessageHandler::new(self.registry.clone(), self.events.clone())
    }

    pub fn mark_deal_handler(&self) -> MarkDealHandler {
        MarkDealHandler::new(self.registry.clone(), self.events.clone())
    }

    pub fn capture_lead_handler(&self) -> CaptureLeadHandler {
        CaptureLeadHandler::new(
            self.registry.clone(),
            self.lead_store.clone(),
            self.events.clone(),
            self.after_capture,
        )
    }

    pub fn cancel_lead_capture_handler(&self) -> CancelLeadCaptureHandler {
        CancelLeadCaptureHandler::new(self.registry.clone(), self.events.clone())
    }

    pub fn get_transcript_handler(&self) -> GetTranscriptHandler {
        GetTranscriptHandler::new(self.registry.clone())
    }

    pub fn list_sessions_handler(&self) -> ListSessionsHandler {
        ListSessionsHandler::new(self.registry.clone())
    }

    pub fn close_session_handler(&self) -> CloseSessionHandler {
        CloseSessionHandler::new(self.registry.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Open (or rejoin) the session for a buyer and listing
pub async fn open_session(
    State(state): State<SessionAppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Response {
    let buyer = match BuyerId::new(req.buyer_id) {
        Ok(buyer) => buyer,
        Err(e) => return bad_request(e.to_string()),
    };
    let listing = match ListingId::new(req.listing_id) {
        Ok(listing) => listing,
        Err(e) => return bad_request(e.to_string()),
    };
    let key = SessionKey::new(buyer, listing);

    match state
        .open_session_handler()
        .handle(OpenSessionCommand { key })
        .await
    {
        Ok(result) => {
            let status = if result.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(SessionOpenedResponse::from(result))).into_response()
        }
        Err(e) => handle_open_error(e),
    }
}

/// GET /api/sessions - List live sessions for the agent dashboard
pub async fn list_sessions(State(state): State<SessionAppState>) -> Response {
    let summaries = state.list_sessions_handler().handle().await;
    (StatusCode::OK, Json(SessionListResponse::from(summaries))).into_response()
}

/// GET /api/sessions/:key - Full transcript of one session
pub async fn get_transcript(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .get_transcript_handler()
        .handle(GetTranscriptQuery { key })
        .await
    {
        Ok(view) => (StatusCode::OK, Json(TranscriptResponse::from(view))).into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/messages - Submit a buyer message
pub async fn submit_message(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
    Json(req): Json<SubmitMessageRequest>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .submit_message_handler()
        .handle(SubmitMessageCommand {
            key,
            text: req.text,
        })
        .await
    {
        Ok(result) => (
            StatusCode::CREATED,
            Json(MessageAcceptedResponse::from(result)),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/takeover - Human agent takes control
pub async fn take_over(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
    Json(req): Json<TakeOverRequest>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };
    let agent = match AgentId::new(req.agent_id) {
        Ok(agent) => agent,
        Err(e) => return bad_request(e.to_string()),
    };

    match state
        .take_over_handler()
        .handle(TakeOverCommand {
            key,
            agent,
            agent_name: req.agent_name,
        })
        .await
    {
        Ok(result) => (StatusCode::OK, Json(TakeOverResponse::from(result))).into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/release - Return control to the autopilot
pub async fn release_control(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .release_control_handler()
        .handle(ReleaseControlCommand { key: key.clone() })
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(ModeResponse {
                key: key.to_string(),
                mode: result.mode,
            }),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/agent-messages - Human agent reply
pub async fn post_agent_message(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
    Json(req): Json<AgentMessageRequest>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .post_agent_message_handler()
        .handle(PostAgentMessageCommand {
            key,
            text: req.text,
        })
        .await
    {
        Ok(result) => (
            StatusCode::CREATED,
            Json(MessageResponse::from(result.message)),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/deal - Controlling agent marks the deal
pub async fn mark_deal(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
    Json(req): Json<MarkDealRequest>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .mark_deal_handler()
        .handle(MarkDealCommand {
            key: key.clone(),
            kind: req.kind,
        })
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(ModeResponse {
                key: key.to_string(),
                mode: result.mode,
            }),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/lead - Submit the lead-capture form
pub async fn capture_lead(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
    Json(req): Json<CaptureLeadRequest>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .capture_lead_handler()
        .handle(CaptureLeadCommand {
            key,
            name: req.name,
            address: req.address,
            phone: req.phone,
            email: req.email,
            whatsapp: req.whatsapp,
        })
        .await
    {
        Ok(result) => (
            StatusCode::CREATED,
            Json(LeadCapturedResponse::from(result)),
        )
            .into_response(),
        Err(e) => handle_capture_error(e),
    }
}

/// POST /api/sessions/:key/lead/cancel - Back out of lead capture
pub async fn cancel_lead_capture(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .cancel_lead_capture_handler()
        .handle(CancelLeadCaptureCommand { key: key.clone() })
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(ModeResponse {
                key: key.to_string(),
                mode: result.mode,
            }),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

/// POST /api/sessions/:key/close - Close and evict the session
pub async fn close_session(
    State(state): State<SessionAppState>,
    Path(key): Path<String>,
) -> Response {
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state
        .close_session_handler()
        .handle(CloseSessionCommand { key: key.clone() })
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(SessionCommandResponse {
                key: key.to_string(),
                message: "Session closed".to_string(),
            }),
        )
            .into_response(),
        Err(e) => handle_command_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_key(raw: &str) -> Result<SessionKey, Response> {
    raw.parse::<SessionKey>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(
                "Invalid session key; expected 'buyer:listing'",
            )),
        )
            .into_response()
    })
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}

fn handle_command_error(error: SessionCommandError) -> Response {
    match &error {
        SessionCommandError::SessionNotFound(key) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Session", &key.to_string())),
        )
            .into_response(),
        SessionCommandError::Session(e) => session_error_response(e),
    }
}

fn session_error_response(error: &SessionError) -> Response {
    match error {
        SessionError::Closed => {
            (StatusCode::GONE, Json(ErrorResponse::session_closed())).into_response()
        }
        SessionError::InvalidState { .. } | SessionError::AlreadyCaptured => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(error.to_string())),
        )
            .into_response(),
        SessionError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(e.to_string())),
        )
            .into_response(),
    }
}

fn handle_open_error(error: OpenSessionError) -> Response {
    match error {
        OpenSessionError::ListingNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Listing", id.as_str())),
        )
            .into_response(),
        OpenSessionError::CatalogUnavailable(msg) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::upstream(format!(
                "Listing catalog unavailable: {}",
                msg
            ))),
        )
            .into_response(),
    }
}

fn handle_capture_error(error: CaptureLeadError) -> Response {
    match &error {
        CaptureLeadError::SessionNotFound(key) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Session", &key.to_string())),
        )
            .into_response(),
        CaptureLeadError::Validation(contact) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::validation(
                "Invalid buyer contact",
                &contact.fields(),
            )),
        )
            .into_response(),
        CaptureLeadError::AlreadyCaptured => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(error.to_string())),
        )
            .into_response(),
        CaptureLeadError::Persistence(msg) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::upstream(format!(
                "Lead store unavailable: {}",
                msg
            ))),
        )
            .into_response(),
        CaptureLeadError::Session(e) => session_error_response(e),
    }
}
