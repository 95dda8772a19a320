pub mod blood_request;
pub mod health;
pub mod notification;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket upgrade (token query param)
///
/// /blood-requests                      list, create
/// /blood-requests/mine                 own requests
/// /blood-requests/{id}                 get, update, delete
/// /blood-requests/{id}/status          forward-only transition (PUT)
/// /blood-requests/{id}/volunteer       volunteer (POST), sharing toggle (PUT)
///
/// /notifications                       list, delete-all
/// /notifications/after                 polling feed
/// /notifications/unread-count          unread counter
/// /notifications/read-all              bulk read toggle
/// /notifications/{id}/read             single read toggle
/// /notifications/{id}                  delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/blood-requests", blood_request::router())
        .nest("/notifications", notification::router())
}
