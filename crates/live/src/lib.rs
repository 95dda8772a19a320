//! Client-side live channel connector.
//!
//! Connects to the BloodBridge WebSocket endpoint, joins the user's own
//! notification channel, and surfaces pushed notifications over an mpsc
//! channel. Connection establishment retries a bounded number of times with
//! a fixed delay; when the WebSocket transport repeatedly fails, the session
//! falls back to the higher-latency polling transport with the same event
//! semantics.

pub mod client;
pub mod poller;
pub mod reconnect;
pub mod session;

pub use client::{LiveClient, LiveClientError, LiveConnection};
pub use poller::Poller;
pub use reconnect::ReconnectConfig;
pub use session::{ConnectionEvent, ConnectionState, LiveSession};
