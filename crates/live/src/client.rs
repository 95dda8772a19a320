//! WebSocket client for the live notification channel.
//!
//! [`LiveClient`] holds the connection configuration; call
//! [`LiveClient::connect`] to establish a [`LiveConnection`].

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// Configuration handle for the live channel endpoint.
pub struct LiveClient {
    ws_url: String,
    token: Option<String>,
}

/// A live WebSocket connection to the notification server.
pub struct LiveConnection {
    /// The raw WebSocket stream for reading/writing frames.
    pub ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl LiveClient {
    /// Create a new client.
    ///
    /// * `ws_url` - WebSocket endpoint, e.g. `ws://host:3000/api/v1/ws`.
    /// * `token`  - optional bearer token passed as a query parameter so
    ///   the server can authenticate the upgrade.
    pub fn new(ws_url: String, token: Option<String>) -> Self {
        Self { ws_url, token }
    }

    /// WebSocket endpoint URL.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the live channel WebSocket endpoint.
    pub async fn connect(&self) -> Result<LiveConnection, LiveClientError> {
        let url = match &self.token {
            Some(token) => format!("{}?token={token}", self.ws_url),
            None => self.ws_url.clone(),
        };

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            LiveClientError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        tracing::info!(url = %self.ws_url, "Connected to live channel");

        Ok(LiveConnection { ws_stream })
    }
}

/// Errors that can occur when working with the live channel client.
#[derive(Debug, thiserror::Error)]
pub enum LiveClientError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
