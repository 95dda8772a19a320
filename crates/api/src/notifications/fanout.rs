//! Per-recipient notification fanout.
//!
//! For each resolved donor: persist a notification row, push it over the
//! live channel, and send a best-effort email. Recipients are processed
//! concurrently and failures are isolated per recipient; only successful
//! persistence counts toward the reported total.

use std::sync::Arc;

use axum::extract::ws::Message;
use bloodbridge_core::protocol::{LiveNotification, ServerFrame};
use bloodbridge_db::models::blood_request::BloodRequest;
use bloodbridge_db::models::enums::NotificationKind;
use bloodbridge_db::models::notification::{NewNotification, Notification};
use bloodbridge_db::models::user::DonorContact;
use bloodbridge_db::repositories::NotificationRepo;
use bloodbridge_db::DbPool;
use bloodbridge_events::Mailer;
use futures::future::join_all;

use crate::ws::WsManager;

/// Persistence seam for notifications.
///
/// The fanout holds this as `Arc<dyn NotificationSink>` so tests can record
/// writes and inject per-recipient faults.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn persist(&self, input: &NewNotification) -> Result<Notification, sqlx::Error>;
}

/// Sink backed by the `notifications` table.
pub struct PgNotificationSink {
    pool: DbPool,
}

impl PgNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationSink for PgNotificationSink {
    async fn persist(&self, input: &NewNotification) -> Result<Notification, sqlx::Error> {
        NotificationRepo::create(&self.pool, input).await
    }
}

/// Dispatches blood request notifications to a resolved recipient set.
pub struct NotificationFanout {
    sink: Arc<dyn NotificationSink>,
    ws_manager: Arc<WsManager>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl NotificationFanout {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        ws_manager: Arc<WsManager>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            sink,
            ws_manager,
            mailer,
        }
    }

    /// Notify every recipient about `request` concurrently.
    ///
    /// Returns the number of successfully persisted notifications. Live push
    /// and email are fire-and-forget and never affect the count.
    pub async fn dispatch(&self, request: &BloodRequest, recipients: &[DonorContact]) -> usize {
        let outcomes = join_all(
            recipients
                .iter()
                .map(|recipient| self.notify_one(request, recipient)),
        )
        .await;

        let sent = outcomes.into_iter().filter(|ok| *ok).count();
        tracing::info!(
            request_id = request.id,
            recipients = recipients.len(),
            sent,
            "Blood request fanout complete"
        );
        sent
    }

    /// Persist, push, and email one recipient.
    ///
    /// The live payload is derived from the persisted row, so persistence
    /// always happens before the push. A persistence failure skips the
    /// remaining steps for that recipient only.
    async fn notify_one(&self, request: &BloodRequest, recipient: &DonorContact) -> bool {
        let input = NewNotification {
            user_id: recipient.id,
            kind: NotificationKind::BloodRequest,
            message: format!(
                "A blood request for {} is needed in {}.",
                request.blood_group, request.city
            ),
            redirect_url: format!("/blood-bridge/request/{}", request.id),
            data: Some(serde_json::json!({ "bloodRequestId": request.id })),
        };

        let row = match self.sink.persist(&input).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(
                    request_id = request.id,
                    recipient = recipient.id,
                    error = %e,
                    "Failed to persist notification"
                );
                return false;
            }
        };

        self.push_live(&row).await;
        self.spawn_email(request, recipient);

        true
    }

    /// Emit the persisted notification to the owner's live channel.
    async fn push_live(&self, row: &Notification) {
        let frame = ServerFrame::BloodRequest {
            payload: LiveNotification {
                kind: row.kind.as_str().to_string(),
                message: row.message.clone(),
                redirect_url: row.redirect_url.clone(),
                data: row.data.clone(),
                created_at: row.created_at,
            },
        };

        match serde_json::to_string(&frame) {
            Ok(text) => {
                let delivered = self
                    .ws_manager
                    .send_to_user(row.user_id, Message::Text(text.into()))
                    .await;
                tracing::debug!(
                    user_id = row.user_id,
                    connections = delivered,
                    "Live notification emitted"
                );
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode live notification"),
        }
    }

    /// Spawn a best-effort email to the recipient.
    ///
    /// Skipped when no mailer is configured or the donor has no address.
    /// Failures are logged and never retried.
    fn spawn_email(&self, request: &BloodRequest, recipient: &DonorContact) {
        let Some(mailer) = &self.mailer else { return };
        if recipient.email.trim().is_empty() {
            return;
        }

        let mailer = Arc::clone(mailer);
        let to = recipient.email.clone();
        let blood_group = request.blood_group.as_str();
        let city = request.city.clone();
        let request_id = request.id;

        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_blood_request(&to, blood_group, &city, request_id)
                .await
            {
                tracing::warn!(request_id, error = %e, "Failed to send notification email");
            }
        });
    }
}
