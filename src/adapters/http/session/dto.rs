//! HTTP DTOs for session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CaptureLeadResult, OpenSessionResult, SessionSummary, SubmitMessageResult, TakeOverResult,
    TranscriptView,
};
use crate::domain::conversation::{Message, Sender};
use crate::domain::session::{DealKind, DealStatus, SessionMode};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to open (or rejoin) the session for a buyer and listing.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSessionRequest {
    pub buyer_id: String,
    pub listing_id: String,
}

/// Request body for a buyer message.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

/// Request for a human agent to take over the session.
#[derive(Debug, Clone, Deserialize)]
pub struct TakeOverRequest {
    pub agent_id: String,
    /// Display name used in the joined-the-chat notice; falls back to the
    /// agent id when omitted.
    #[serde(default)]
    pub agent_name: String,
}

/// Request body for a human-agent reply.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentMessageRequest {
    pub text: String,
}

/// Request for the controlling agent to mark the deal closed.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkDealRequest {
    pub kind: DealKind,
}

/// Buyer contact details submitted on the lead-capture form.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureLeadRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub whatsapp: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A dialogue message as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub sequence: u64,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id().to_string(),
            sender: message.sender(),
            text: message.text().to_string(),
            sequence: message.sequence(),
            created_at: message.created_at().as_datetime().to_rfc3339(),
        }
    }
}

/// Recorded deal commitment.
#[derive(Debug, Clone, Serialize)]
pub struct DealStatusResponse {
    pub kind: DealKind,
    pub confidence: f32,
}

impl From<DealStatus> for DealStatusResponse {
    fn from(status: DealStatus) -> Self {
        Self {
            kind: status.kind,
            confidence: status.confidence,
        }
    }
}

/// Response to opening a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOpenedResponse {
    pub key: String,
    pub created: bool,
    pub mode: SessionMode,
    pub messages: Vec<MessageResponse>,
}

impl From<OpenSessionResult> for SessionOpenedResponse {
    fn from(result: OpenSessionResult) -> Self {
        Self {
            key: result.key.to_string(),
            created: result.created,
            mode: result.mode,
            messages: result.messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response to a buyer message submission.
#[derive(Debug, Clone, Serialize)]
pub struct MessageAcceptedResponse {
    pub message: MessageResponse,
    /// True when an autopilot reply is being generated; it arrives through
    /// the event stream.
    pub reply_pending: bool,
}

impl From<SubmitMessageResult> for MessageAcceptedResponse {
    fn from(result: SubmitMessageResult) -> Self {
        Self {
            message: result.message.into(),
            reply_pending: result.reply_pending,
        }
    }
}

/// Response to a takeover: the join notice and the new mode.
#[derive(Debug, Clone, Serialize)]
pub struct TakeOverResponse {
    pub mode: SessionMode,
    pub message: MessageResponse,
}

impl From<TakeOverResult> for TakeOverResponse {
    fn from(result: TakeOverResult) -> Self {
        Self {
            mode: result.mode,
            message: result.message.into(),
        }
    }
}

/// Response naming the session's mode after a control-flow command.
#[derive(Debug, Clone, Serialize)]
pub struct ModeResponse {
    pub key: String,
    pub mode: SessionMode,
}

/// Response to a successful lead capture.
#[derive(Debug, Clone, Serialize)]
pub struct LeadCapturedResponse {
    pub lead_id: String,
    pub mode: SessionMode,
    pub confirmation: MessageResponse,
}

impl From<CaptureLeadResult> for LeadCapturedResponse {
    fn from(result: CaptureLeadResult) -> Self {
        Self {
            lead_id: result.lead_id.to_string(),
            mode: result.mode,
            confirmation: result.confirmation.into(),
        }
    }
}

/// Full transcript of one session.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub key: String,
    pub mode: SessionMode,
    pub listing_title: String,
    pub messages: Vec<MessageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal: Option<DealStatusResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
}

impl From<TranscriptView> for TranscriptResponse {
    fn from(view: TranscriptView) -> Self {
        Self {
            key: view.key.to_string(),
            mode: view.mode,
            listing_title: view.listing_title,
            messages: view.messages.into_iter().map(Into::into).collect(),
            deal: view.deal.map(Into::into),
            lead_id: view.lead_id.map(|id| id.to_string()),
        }
    }
}

/// Session summary for the agent dashboard list.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummaryResponse {
    pub key: String,
    pub mode: SessionMode,
    pub listing_title: String,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal: Option<DealStatusResponse>,
    pub last_activity: String,
}

impl From<SessionSummary> for SessionSummaryResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            key: summary.key.to_string(),
            mode: summary.mode,
            listing_title: summary.listing_title,
            message_count: summary.message_count,
            deal: summary.deal.map(Into::into),
            last_activity: summary.last_activity.as_datetime().to_rfc3339(),
        }
    }
}

/// List of live sessions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummaryResponse>,
    pub total: usize,
}

impl From<Vec<SessionSummary>> for SessionListResponse {
    fn from(summaries: Vec<SessionSummary>) -> Self {
        let sessions: Vec<SessionSummaryResponse> =
            summaries.into_iter().map(Into::into).collect();
        let total = sessions.len();
        Self { sessions, total }
    }
}

/// Acknowledgement for commands with no richer payload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCommandResponse {
    pub key: String,
    pub message: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            code: "CONFLICT".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn session_closed() -> Self {
        Self {
            code: "SESSION_CLOSED".to_string(),
            message: "Session is closed".to_string(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
            details: Some(serde_json::json!({ "fields": fields })),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            code: "UPSTREAM_UNAVAILABLE".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_session_request_deserializes() {
        let json = r#"{"buyer_id": "buyer-7", "listing_id": "lst-42"}"#;
        let req: OpenSessionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.buyer_id, "buyer-7");
        assert_eq!(req.listing_id, "lst-42");
    }

    #[test]
    fn take_over_request_defaults_agent_name() {
        let json = r#"{"agent_id": "agent-3"}"#;
        let req: TakeOverRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.agent_id, "agent-3");
        assert!(req.agent_name.is_empty());
    }

    #[test]
    fn mark_deal_request_parses_kind() {
        let json = r#"{"kind": "viewing"}"#;
        let req: MarkDealRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, DealKind::Viewing);
    }

    #[test]
    fn message_response_conversion() {
        let message = Message::new(Sender::Buyer, "Is it still available?", 4).unwrap();
        let response: MessageResponse = message.clone().into();

        assert_eq!(response.id, message.id().to_string());
        assert_eq!(response.sender, Sender::Buyer);
        assert_eq!(response.text, "Is it still available?");
        assert_eq!(response.sequence, 4);
    }

    #[test]
    fn transcript_response_omits_absent_deal() {
        let message = Message::new(Sender::System, "notice", 0).unwrap();
        let response = TranscriptResponse {
            key: "b:l".to_string(),
            mode: SessionMode::Autopilot,
            listing_title: "Loft".to_string(),
            messages: vec![message.into()],
            deal: None,
            lead_id: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("deal").is_none());
        assert!(json.get("lead_id").is_none());
        assert_eq!(json["mode"], "autopilot");
    }

    #[test]
    fn session_list_response_counts_sessions() {
        let response: SessionListResponse = SessionListResponse::from(Vec::new());
        assert_eq!(response.total, 0);
        assert!(response.sessions.is_empty());
    }

    #[test]
    fn error_response_validation_lists_fields() {
        let error = ErrorResponse::validation("Invalid buyer contact", &["email", "phone"]);
        assert_eq!(error.code, "VALIDATION_FAILED");
        let details = error.details.unwrap();
        assert_eq!(details["fields"][0], "email");
        assert_eq!(details["fields"][1], "phone");
    }

    #[test]
    fn error_response_not_found_names_resource() {
        let error = ErrorResponse::not_found("Session", "buyer-1:lst-9");
        assert_eq!(error.code, "NOT_FOUND");
        assert!(error.message.contains("Session"));
        assert!(error.message.contains("buyer-1:lst-9"));
    }
}
