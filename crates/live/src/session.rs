//! Live channel session: state machine and run loop.
//!
//! A session owns one logical subscription to the user's notification
//! channel. Each underlying connection moves through
//! `Connecting -> Connected -> Joined -> Disconnected`; from `Disconnected`
//! a new cycle may begin, subject to the bounded retry budget. A
//! server-initiated close gets one immediate reconnect before the normal
//! budget applies. When the WebSocket transport cannot be established at
//! all, the session degrades to the polling transport.

use bloodbridge_core::protocol::{ClientFrame, LiveNotification, ServerFrame};
use bloodbridge_core::types::DbId;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::{LiveClient, LiveConnection};
use crate::poller::Poller;
use crate::reconnect::{connect_with_retries, ReconnectConfig};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle state of one live channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Joined(DbId),
    Disconnected,
}

/// Observable event driving the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The transport handshake completed.
    Opened,
    /// The server acknowledged the join frame.
    JoinAcknowledged(DbId),
    /// The transport closed, for any reason.
    Closed,
}

impl ConnectionState {
    /// Advance the state machine by one event.
    ///
    /// Invalid combinations leave the state unchanged; `Closed` always
    /// moves to `Disconnected`.
    pub fn on(self, event: ConnectionEvent) -> ConnectionState {
        match (self, event) {
            (_, ConnectionEvent::Closed) => ConnectionState::Disconnected,
            (ConnectionState::Connecting, ConnectionEvent::Opened) => ConnectionState::Connected,
            (ConnectionState::Disconnected, ConnectionEvent::Opened) => ConnectionState::Connected,
            (ConnectionState::Connected, ConnectionEvent::JoinAcknowledged(id)) => {
                ConnectionState::Joined(id)
            }
            (state, _) => state,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A running subscription to one user's notification channel.
pub struct LiveSession {
    client: LiveClient,
    poller: Poller,
    user_id: DbId,
    reconnect: ReconnectConfig,
}

impl LiveSession {
    pub fn new(client: LiveClient, poller: Poller, user_id: DbId) -> Self {
        Self {
            client,
            poller,
            user_id,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Override the retry budget.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Run the session until cancelled.
    ///
    /// Received notifications are forwarded to `events`. If the WebSocket
    /// transport cannot be established within the retry budget, the session
    /// switches to polling for its remaining lifetime; the caller must
    /// re-initiate to try WebSocket again.
    pub async fn run(
        self,
        events: mpsc::UnboundedSender<LiveNotification>,
        cancel: CancellationToken,
    ) {
        let mut server_initiated_retry = false;

        loop {
            if cancel.is_cancelled() {
                return;
            }

            let conn = if server_initiated_retry {
                // One immediate reconnect after a server-initiated close.
                server_initiated_retry = false;
                self.client.connect().await.ok()
            } else {
                connect_with_retries(&self.client, &self.reconnect, &cancel).await
            };

            let Some(conn) = conn else {
                if cancel.is_cancelled() {
                    return;
                }
                tracing::warn!("Falling back to polling transport");
                self.run_polling(&events, &cancel).await;
                return;
            };

            match self.run_connection(conn, &events, &cancel).await {
                Disconnection::ServerInitiated => server_initiated_retry = true,
                Disconnection::Other => {}
            }
        }
    }

    /// Drive a single established connection until it drops.
    async fn run_connection(
        &self,
        conn: LiveConnection,
        events: &mpsc::UnboundedSender<LiveNotification>,
        cancel: &CancellationToken,
    ) -> Disconnection {
        let mut state = ConnectionState::Connecting.on(ConnectionEvent::Opened);
        let (mut sink, mut stream) = conn.ws_stream.split();

        // Register interest in our own channel.
        let join = ClientFrame::Join {
            user_id: self.user_id,
        };
        let frame = match serde_json::to_string(&join) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode join frame");
                return Disconnection::Other;
            }
        };
        if sink.send(Message::Text(frame.into())).await.is_err() {
            return Disconnection::Other;
        }

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Disconnection::Other;
                }
                message = stream.next() => message,
            };

            match message {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(ServerFrame::Joined { user_id }) => {
                        state = state.on(ConnectionEvent::JoinAcknowledged(user_id));
                        tracing::info!(user_id, "Joined notification channel");
                    }
                    Ok(ServerFrame::JoinRejected { reason }) => {
                        tracing::warn!(reason = %reason, "Join rejected");
                        return Disconnection::Other;
                    }
                    Ok(ServerFrame::BloodRequest { payload }) => {
                        if events.send(payload).is_err() {
                            // Receiver dropped; nothing left to deliver to.
                            return Disconnection::Other;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring unrecognized frame");
                    }
                },
                Some(Ok(Message::Close(_))) => {
                    state = state.on(ConnectionEvent::Closed);
                    tracing::info!(?state, "Server closed the connection");
                    return Disconnection::ServerInitiated;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Live channel receive error");
                    return Disconnection::Other;
                }
                None => return Disconnection::Other,
            }
        }
    }

    /// Poll the notification feed until cancelled.
    async fn run_polling(
        &self,
        events: &mpsc::UnboundedSender<LiveNotification>,
        cancel: &CancellationToken,
    ) {
        let mut watermark = chrono::Utc::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.poller.interval) => {}
            }

            match self.poller.poll_once(watermark).await {
                Ok(notifications) => {
                    // The feed is newest-first; forward in chronological order.
                    for notification in notifications.into_iter().rev() {
                        if notification.created_at > watermark {
                            watermark = notification.created_at;
                        }
                        if events.send(notification).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Poll failed");
                }
            }
        }
    }
}

/// Why a connection ended, from the session's perspective.
enum Disconnection {
    /// The server sent a Close frame; one immediate reconnect is attempted.
    ServerInitiated,
    /// Anything else: transport error, cancellation, or rejected join.
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_joined() {
        let state = ConnectionState::Connecting
            .on(ConnectionEvent::Opened)
            .on(ConnectionEvent::JoinAcknowledged(7));
        assert_eq!(state, ConnectionState::Joined(7));
    }

    #[test]
    fn close_always_disconnects() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Joined(1),
            ConnectionState::Disconnected,
        ] {
            assert_eq!(state.on(ConnectionEvent::Closed), ConnectionState::Disconnected);
        }
    }

    #[test]
    fn join_ack_requires_connected() {
        let state = ConnectionState::Connecting.on(ConnectionEvent::JoinAcknowledged(1));
        assert_eq!(state, ConnectionState::Connecting);
    }

    #[test]
    fn disconnected_can_start_a_new_cycle() {
        let state = ConnectionState::Disconnected.on(ConnectionEvent::Opened);
        assert_eq!(state, ConnectionState::Connected);
    }
}
