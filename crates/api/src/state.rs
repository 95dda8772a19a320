use std::sync::Arc;

use bloodbridge_events::Mailer;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: bloodbridge_db::DbPool,
    /// Server configuration (JWT secret, timeouts, CORS origins).
    pub config: Arc<ServerConfig>,
    /// WebSocket channel registry for live notification push.
    pub ws_manager: Arc<WsManager>,
    /// Email delivery, if SMTP is configured. `None` disables the email leg
    /// of the fanout without affecting persistence or live push.
    pub mailer: Option<Arc<dyn Mailer>>,
}
