//! Resolver and fanout tests with mock collaborators.
//!
//! These tests cover the tiered recipient resolution order, short-circuit
//! behaviour, per-recipient failure isolation, and the persisted-then-pushed
//! ordering guarantee, all without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use bloodbridge_api::notifications::{
    DonorDirectory, NotificationFanout, NotificationSink, RecipientResolver,
};
use bloodbridge_api::ws::WsManager;
use bloodbridge_core::protocol::ServerFrame;
use bloodbridge_core::types::DbId;
use bloodbridge_db::models::blood_request::{Address, BloodRequest};
use bloodbridge_db::models::enums::{BloodGroup, NotificationKind, RequestStatus, Urgency};
use bloodbridge_db::models::notification::{NewNotification, Notification};
use bloodbridge_db::models::user::DonorContact;
use bloodbridge_db::repositories::LocationTier;

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// Directory returning canned donor sets per tier and recording the order
/// of tier queries.
struct TierDirectory {
    responses: HashMap<LocationTier, Vec<DonorContact>>,
    queried: Mutex<Vec<LocationTier>>,
}

impl TierDirectory {
    fn new(responses: HashMap<LocationTier, Vec<DonorContact>>) -> Self {
        Self {
            responses,
            queried: Mutex::new(Vec::new()),
        }
    }

    fn queried_tiers(&self) -> Vec<LocationTier> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DonorDirectory for TierDirectory {
    async fn find_donors_at(
        &self,
        tier: LocationTier,
        _blood_group: BloodGroup,
        _address: &Address,
        _exclude: DbId,
    ) -> Result<Vec<DonorContact>, sqlx::Error> {
        self.queried.lock().unwrap().push(tier);
        Ok(self.responses.get(&tier).cloned().unwrap_or_default())
    }
}

/// Sink recording persisted notifications, with optional per-user faults.
struct RecordingSink {
    fail_for: Vec<DbId>,
    rows: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl RecordingSink {
    fn new() -> Self {
        Self::failing_for(vec![])
    }

    fn failing_for(fail_for: Vec<DbId>) -> Self {
        Self {
            fail_for,
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn persisted(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingSink {
    async fn persist(&self, input: &NewNotification) -> Result<Notification, sqlx::Error> {
        if self.fail_for.contains(&input.user_id) {
            return Err(sqlx::Error::PoolClosed);
        }
        let now = chrono::Utc::now();
        let row = Notification {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: input.user_id,
            kind: input.kind,
            message: input.message.clone(),
            redirect_url: input.redirect_url.clone(),
            data: input.data.clone(),
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn donor(id: DbId) -> DonorContact {
    DonorContact {
        id,
        email: format!("donor{id}@example.com"),
    }
}

fn request() -> BloodRequest {
    let now = chrono::Utc::now();
    BloodRequest {
        id: 12,
        user_id: 1,
        blood_group: BloodGroup::BPositive,
        urgency: Urgency::High,
        message: "Urgent blood required".into(),
        contact_phone: "9876543210".into(),
        contact_email: None,
        status: RequestStatus::Pending,
        state: "Maharashtra".into(),
        district: "Pune district".into(),
        city: "Pune".into(),
        created_at: now,
        updated_at: now,
    }
}

fn address() -> Address {
    Address {
        state: "Maharashtra".into(),
        district: "Pune district".into(),
        city: "Pune".into(),
    }
}

fn fanout(sink: Arc<RecordingSink>, ws_manager: Arc<WsManager>) -> NotificationFanout {
    NotificationFanout::new(sink, ws_manager, None)
}

// ---------------------------------------------------------------------------
// Resolver: tier order and short-circuit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn city_tier_match_short_circuits() {
    let directory = Arc::new(TierDirectory::new(HashMap::from([(
        LocationTier::City,
        vec![donor(2), donor(3), donor(4)],
    )])));
    let resolver = RecipientResolver::new(directory.clone());

    let recipients = resolver
        .resolve(BloodGroup::BPositive, &address(), 1)
        .await
        .unwrap();

    assert_eq!(recipients.len(), 3);
    assert_eq!(directory.queried_tiers(), vec![LocationTier::City]);
}

#[tokio::test]
async fn resolver_widens_to_state_tier() {
    let directory = Arc::new(TierDirectory::new(HashMap::from([(
        LocationTier::State,
        vec![donor(5), donor(6)],
    )])));
    let resolver = RecipientResolver::new(directory.clone());

    let recipients = resolver
        .resolve(BloodGroup::BPositive, &address(), 1)
        .await
        .unwrap();

    assert_eq!(recipients.len(), 2);
    assert_eq!(
        directory.queried_tiers(),
        vec![LocationTier::City, LocationTier::District, LocationTier::State]
    );
}

#[tokio::test]
async fn resolver_returns_empty_when_no_tier_matches() {
    let directory = Arc::new(TierDirectory::new(HashMap::new()));
    let resolver = RecipientResolver::new(directory.clone());

    let recipients = resolver
        .resolve(BloodGroup::ONegative, &address(), 1)
        .await
        .unwrap();

    assert!(recipients.is_empty());
    assert_eq!(directory.queried_tiers().len(), 3);
}

// ---------------------------------------------------------------------------
// Fanout: counting and failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fanout_counts_all_persisted_recipients() {
    let sink = Arc::new(RecordingSink::new());
    let fanout = fanout(sink.clone(), Arc::new(WsManager::new()));

    let recipients = vec![donor(2), donor(3), donor(4)];
    let sent = fanout.dispatch(&request(), &recipients).await;

    assert_eq!(sent, 3);
    let rows = sink.persisted();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.kind, NotificationKind::BloodRequest);
        assert_eq!(row.message, "A blood request for B+ is needed in Pune.");
        assert_eq!(row.redirect_url, "/blood-bridge/request/12");
        assert_eq!(row.data, Some(serde_json::json!({ "bloodRequestId": 12 })));
    }
}

#[tokio::test]
async fn fanout_with_no_recipients_returns_zero() {
    let sink = Arc::new(RecordingSink::new());
    let fanout = fanout(sink.clone(), Arc::new(WsManager::new()));

    let sent = fanout.dispatch(&request(), &[]).await;

    assert_eq!(sent, 0);
    assert!(sink.persisted().is_empty());
}

#[tokio::test]
async fn persistence_failure_excludes_only_that_recipient() {
    let sink = Arc::new(RecordingSink::failing_for(vec![3]));
    let fanout = fanout(sink.clone(), Arc::new(WsManager::new()));

    let recipients = vec![donor(2), donor(3), donor(4)];
    let sent = fanout.dispatch(&request(), &recipients).await;

    assert_eq!(sent, 2);
    let persisted_users: Vec<DbId> = sink.persisted().iter().map(|r| r.user_id).collect();
    assert_eq!(persisted_users, vec![2, 4]);
}

// ---------------------------------------------------------------------------
// Fanout: live push
// ---------------------------------------------------------------------------

#[tokio::test]
async fn joined_recipient_receives_live_frame() {
    let ws_manager = Arc::new(WsManager::new());
    let mut rx = ws_manager.add("conn-1".to_string()).await;
    ws_manager.join("conn-1", 2).await;

    let sink = Arc::new(RecordingSink::new());
    let fanout = fanout(sink, ws_manager.clone());

    let sent = fanout.dispatch(&request(), &[donor(2)]).await;
    assert_eq!(sent, 1);

    let msg = rx.recv().await.expect("joined recipient should be pushed");
    let Message::Text(text) = msg else {
        panic!("Expected a text frame, got: {msg:?}");
    };
    let frame: ServerFrame = serde_json::from_str(&text).unwrap();
    assert_matches!(frame, ServerFrame::BloodRequest { payload } => {
        assert_eq!(payload.kind, "blood_request");
        assert_eq!(payload.message, "A blood request for B+ is needed in Pune.");
        assert_eq!(payload.redirect_url, "/blood-bridge/request/12");
        assert_eq!(payload.data, Some(serde_json::json!({ "bloodRequestId": 12 })));
    });
}

#[tokio::test]
async fn offline_recipient_is_still_counted() {
    // Nobody has joined the channel; the push is a silent no-op but the
    // notification is persisted and counted.
    let sink = Arc::new(RecordingSink::new());
    let fanout = fanout(sink.clone(), Arc::new(WsManager::new()));

    let sent = fanout.dispatch(&request(), &[donor(2)]).await;

    assert_eq!(sent, 1);
    assert_eq!(sink.persisted().len(), 1);
}
