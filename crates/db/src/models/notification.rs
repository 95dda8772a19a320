//! Notification entity models and DTOs.

use bloodbridge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::NotificationKind;

/// A row from the `notifications` table.
///
/// Only ever returned to its owning user; every repository query is scoped
/// by `user_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a notification, built by the fanout step.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub kind: NotificationKind,
    pub message: String,
    pub redirect_url: String,
    pub data: Option<serde_json::Value>,
}
