//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`], and every query
//! is scoped to the authenticated owner.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bloodbridge_core::error::CoreError;
use bloodbridge_core::types::DbId;
use bloodbridge_db::models::notification::Notification;
use bloodbridge_db::repositories::NotificationRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Query parameters for `GET /notifications/after`.
#[derive(Debug, Deserialize)]
pub struct AfterQuery {
    /// RFC 3339 timestamp; only notifications created strictly after this
    /// instant are returned.
    pub time: Option<String>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's notifications, newest first, with optional
/// unread filtering.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, unread_only, limit, offset)
            .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/after?time=<rfc3339>
///
/// Polling-transport feed: notifications created strictly after the given
/// instant. Returns 400 when the timestamp is missing or unparseable.
pub async fn list_notifications_after(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AfterQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let raw = params
        .time
        .ok_or_else(|| AppError::BadRequest("Missing time query parameter".into()))?;
    let after = chrono::DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid time parameter: {e}")))?
        .with_timezone(&chrono::Utc);

    let notifications = NotificationRepo::list_after(&state.pool, auth.user_id, after).await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
///
/// Return the number of unread notifications for the authenticated user.
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}

// ---------------------------------------------------------------------------
// Read toggles
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Idempotent: marking an already-read
/// notification succeeds again. Returns 204 No Content on success, or 404
/// if the notification does not belong to the authenticated user.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
///
/// Mark all of the authenticated user's notifications as read.
/// Returns the number of notifications that were marked.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /api/v1/notifications/{id}
///
/// Delete one owned notification. Returns 204, or 404 if the notification
/// does not belong to the authenticated user.
pub async fn delete_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let removed = NotificationRepo::delete(&state.pool, notification_id, auth.user_id).await?;

    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/notifications
///
/// Delete every notification owned by the authenticated user. Other users'
/// notifications are untouched. Returns the number of rows removed.
pub async fn delete_all_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::delete_all_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "deleted": count }
    })))
}
