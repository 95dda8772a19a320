//! Polling transport fallback.
//!
//! When the WebSocket transport cannot be established, the session polls
//! `GET /api/v1/notifications/after` instead. The feed returns full
//! notification rows; the extra fields are ignored during deserialization
//! so the channel semantics stay identical to the live push.

use std::time::Duration;

use bloodbridge_core::protocol::LiveNotification;
use bloodbridge_core::types::Timestamp;
use serde::Deserialize;

/// Default delay between polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Errors from the polling transport.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Poll request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// `{ "data": [...] }` envelope returned by the notifications feed.
#[derive(Debug, Deserialize)]
struct PollResponse {
    data: Vec<LiveNotification>,
}

/// Polls the notification feed over HTTP.
pub struct Poller {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    /// Delay between polls.
    pub interval: Duration,
}

impl Poller {
    /// Create a poller against an API base URL, e.g. `http://host:3000`.
    pub fn new(api_url: String, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            token,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Fetch notifications created strictly after `after`, newest first.
    pub async fn poll_once(&self, after: Timestamp) -> Result<Vec<LiveNotification>, PollError> {
        let url = format!("{}/api/v1/notifications/after", self.api_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("time", after.to_rfc3339())]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let body: PollResponse = response.json().await?;
        Ok(body.data)
    }
}
