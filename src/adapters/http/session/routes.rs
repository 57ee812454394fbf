//! HTTP routes for session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_lead_capture, capture_lead, close_session, get_transcript, list_sessions, mark_deal,
    open_session, post_agent_message, release_control, submit_message, take_over, SessionAppState,
};
use super::ws_handler::session_events;

/// Creates the session router with all endpoints.
pub fn session_routes(state: SessionAppState) -> Router {
    Router::new()
        .route("/", post(open_session))
        .route("/", get(list_sessions))
        .route("/:key", get(get_transcript))
        .route("/:key/messages", post(submit_message))
        .route("/:key/takeover", post(take_over))
        .route("/:key/release", post(release_control))
        .route("/:key/agent-messages", post(post_agent_message))
        .route("/:key/deal", post(mark_deal))
        .route("/:key/lead", post(capture_lead))
        .route("/:key/lead/cancel", post(cancel_lead_capture))
        .route("/:key/close", post(close_session))
        .route("/:key/events", get(session_events))
        .with_state(state)
}
