//! Bounded fixed-delay reconnection for the live channel.
//!
//! Connection attempts retry up to [`ReconnectConfig::max_attempts`] times
//! with a fixed delay between attempts. Once the budget is exhausted the
//! caller is expected to fall back to the polling transport.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{LiveClient, LiveConnection};

/// Tunable parameters for the bounded retry strategy.
pub struct ReconnectConfig {
    /// Maximum number of connection attempts before giving up.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl ReconnectConfig {
    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

/// Attempt to connect with bounded fixed-delay retries.
///
/// Returns `Some(connection)` once a connection succeeds, or `None` if the
/// attempt budget is exhausted or the `cancel` token is triggered first.
pub async fn connect_with_retries(
    client: &LiveClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<LiveConnection> {
    let mut attempt = 0u32;

    while config.allows(attempt) {
        attempt += 1;
        tracing::info!(attempt, max = config.max_attempts, "Connecting to live channel");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Connect cancelled");
                return None;
            }
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(attempt, "Live channel connected");
                        return Some(conn);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Connect attempt {attempt} failed");
                    }
                }
            }
        }

        if !config.allows(attempt) {
            break;
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(config.delay) => {}
        }
    }

    tracing::warn!(
        attempts = attempt,
        "Live channel connect budget exhausted"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_matches_client_settings() {
        let config = ReconnectConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.delay, Duration::from_secs(1));
    }

    #[test]
    fn allows_attempts_up_to_the_budget() {
        let config = ReconnectConfig {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        };
        assert!(config.allows(0));
        assert!(config.allows(2));
        assert!(!config.allows(3));
        assert!(!config.allows(4));
    }

    #[tokio::test]
    async fn cancellation_token_stops_connecting() {
        let cancel = CancellationToken::new();
        // Cancel immediately; the loop should return None without connecting.
        cancel.cancel();

        let client = LiveClient::new("ws://localhost:9999/api/v1/ws".into(), None);
        let config = ReconnectConfig::default();

        let result = connect_with_retries(&client, &config, &cancel).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn exhausted_budget_returns_none() {
        let cancel = CancellationToken::new();
        // Nothing listens on this port, so every attempt fails fast.
        let client = LiveClient::new("ws://127.0.0.1:1/api/v1/ws".into(), None);
        let config = ReconnectConfig {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        };

        let result = connect_with_retries(&client, &config, &cancel).await;
        assert!(result.is_none());
    }
}
