//! Live channel wire protocol.
//!
//! Frames are JSON objects tagged by an `event` field, shared between the
//! server's WebSocket registry and the client connector so both sides agree
//! on the shape.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Notification payload pushed over a live channel and returned by the
/// polling feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Frames sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Register this connection under the client's own identity.
    #[serde(rename_all = "camelCase")]
    Join { user_id: DbId },
}

/// Frames sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Acknowledges a successful join.
    #[serde(rename_all = "camelCase")]
    Joined { user_id: DbId },
    /// A join was refused (missing or mismatched authentication).
    #[serde(rename_all = "camelCase")]
    JoinRejected { reason: String },
    /// A blood request notification targeted at this channel.
    #[serde(rename_all = "camelCase")]
    BloodRequest { payload: LiveNotification },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_frame_wire_shape() {
        let json = serde_json::to_value(ClientFrame::Join { user_id: 7 }).unwrap();
        assert_eq!(json["event"], "join");
        assert_eq!(json["userId"], 7);
    }

    #[test]
    fn blood_request_frame_round_trips() {
        let frame = ServerFrame::BloodRequest {
            payload: LiveNotification {
                kind: "blood_request".into(),
                message: "A blood request for B+ is needed in Pune.".into(),
                redirect_url: "/blood-bridge/request/12".into(),
                data: Some(serde_json::json!({ "bloodRequestId": 12 })),
                created_at: chrono::Utc::now(),
            },
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: ServerFrame = serde_json::from_str(&json).unwrap();
        match back {
            ServerFrame::BloodRequest { payload } => {
                assert_eq!(payload.kind, "blood_request");
                assert_eq!(payload.redirect_url, "/blood-bridge/request/12");
            }
            other => panic!("Unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn data_field_is_omitted_when_absent() {
        let payload = LiveNotification {
            kind: "other".into(),
            message: "hi".into(),
            redirect_url: "/dashboard".into(),
            data: None,
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("data").is_none());
    }
}
