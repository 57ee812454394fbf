//! WebSocket endpoint streaming session events to live viewers.
//!
//! The stream is server-push only: buyer and dashboard clients render the
//! events; every mutation goes through the REST commands. Events are the
//! JSON form of [`SessionEvent`], one frame per event, in publish order.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::domain::foundation::SessionKey;
use crate::ports::SessionEvent;

use super::dto::ErrorResponse;
use super::handlers::SessionAppState;

/// GET /api/sessions/:key/events - Live event stream for one session
pub async fn session_events(
    ws: WebSocketUpgrade,
    Path(key): Path<String>,
    State(state): State<SessionAppState>,
) -> Response {
    let key: SessionKey = match key.parse() {
        Ok(key) => key,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(
                    "Invalid session key; expected 'buyer:listing'",
                )),
            )
                .into_response();
        }
    };

    if state.registry.get(&key).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Session", &key.to_string())),
        )
            .into_response();
    }

    // Subscribe before the upgrade completes so nothing published during
    // the handshake is lost.
    let events = state.hub.subscribe(&key);

    ws.on_upgrade(move |socket| handle_session_socket(socket, key, events))
}

/// Runs for the lifetime of one connection: forwards room events out,
/// drains whatever the client sends, and tears both down together.
async fn handle_session_socket(
    socket: WebSocket,
    key: SessionKey,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(session = %key, "event stream connected");

    let forward_key = key.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(
                                session = %forward_key,
                                "failed to serialize event: {}",
                                e
                            );
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                // The room is gone; the closure event has already been
                // delivered, so end the stream cleanly.
                Err(broadcast::error::RecvError::Closed) => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(session = %forward_key, missed, "event subscriber lagging");
                }
            }
        }
    });

    // Protocol pings are answered by axum; everything else from the client
    // is ignored until it closes.
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(session = %key, "event stream disconnected");
}
