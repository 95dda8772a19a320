use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use bloodbridge_core::error::CoreError;
use bloodbridge_core::protocol::{ClientFrame, ServerFrame};
use bloodbridge_core::types::DbId;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Query parameters accepted on the WebSocket upgrade request.
///
/// Browsers cannot set headers on WebSocket handshakes, so the bearer token
/// travels as a query parameter instead.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// HTTP handler that authenticates and upgrades the connection to WebSocket.
///
/// The upgrade is rejected with 401 when the token is missing or invalid.
/// After the upgrade the connection is registered with `WsManager` and
/// managed by two tasks (sender + receiver).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let token = query.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;

    let claims = validate_token(&token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, claims.sub)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection, unjoined, with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound frames (join handshake) on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, auth_user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = auth_user_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_frame(&ws_manager, &conn_id, auth_user_id, &text).await;
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Process a single inbound text frame.
///
/// The only client frame is `join`, which must carry the same identity the
/// connection authenticated with. Replies go through the manager channel so
/// they serialize with targeted emits.
async fn handle_frame(ws_manager: &WsManager, conn_id: &str, auth_user_id: DbId, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring unrecognized frame");
            return;
        }
    };

    let ClientFrame::Join { user_id } = frame;

    let reply = if user_id == auth_user_id {
        if ws_manager.join(conn_id, user_id).await {
            tracing::info!(conn_id = %conn_id, user_id, "Joined notification channel");
            ServerFrame::Joined { user_id }
        } else {
            ServerFrame::JoinRejected {
                reason: "Connection no longer registered".into(),
            }
        }
    } else {
        tracing::warn!(
            conn_id = %conn_id,
            claimed = user_id,
            authenticated = auth_user_id,
            "Join identity mismatch"
        );
        ServerFrame::JoinRejected {
            reason: "Identity does not match authenticated user".into(),
        }
    };

    match serde_json::to_string(&reply) {
        Ok(text) => {
            ws_manager.send_to_conn(conn_id, Message::Text(text.into())).await;
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode server frame"),
    }
}
