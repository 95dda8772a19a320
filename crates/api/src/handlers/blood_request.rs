//! Handlers for the `/blood-requests` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bloodbridge_core::error::CoreError;
use bloodbridge_core::types::DbId;
use bloodbridge_db::models::blood_request::{
    Address, BloodRequest, CreateBloodRequest, UpdateBloodRequest, VolunteerInput,
    VolunteerPreferenceInput,
};
use bloodbridge_db::models::enums::{BloodGroup, RequestStatus};
use bloodbridge_db::repositories::{BloodRequestRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::notifications::{
    NotificationFanout, PgDonorDirectory, PgNotificationSink, RecipientResolver,
};
use crate::response::{DataResponse, Paginated};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /blood-requests`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by request status.
    pub status: Option<RequestStatus>,
    /// Filter by blood group (clinical notation, e.g. `B+`).
    pub blood_group: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 10, capped at 100.
    pub limit: Option<i64>,
}

/// Body for `PUT /blood-requests/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: RequestStatus,
}

/// Maximum page size for listings.
const MAX_LIMIT: i64 = 100;

/// Default page size for listings.
const DEFAULT_LIMIT: i64 = 10;

fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit, (page - 1) * limit)
}

fn parse_blood_group(raw: Option<String>) -> AppResult<Option<BloodGroup>> {
    raw.map(|s| s.parse::<BloodGroup>())
        .transpose()
        .map_err(AppError::BadRequest)
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

/// POST /api/v1/blood-requests
///
/// Validate and persist a new blood request, then resolve recipients and
/// fan out notifications. The fanout runs as a detached task so a client
/// disconnect cannot cancel it; the handler awaits only its count.
pub async fn create_blood_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBloodRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate().map_err(AppError::Core)?;

    let created = BloodRequestRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(
        request_id = created.id,
        user_id = auth.user_id,
        blood_group = %created.blood_group,
        "Blood request created"
    );

    let notifications_sent = notify_donors(&state, created.clone()).await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": {
                "bloodRequest": created,
                "notificationsSent": notifications_sent,
            }
        })),
    ))
}

/// Resolve recipients and dispatch notifications for a new request.
///
/// Spawned as its own task and awaited through the `JoinHandle`, so the
/// fanout keeps running even if the response future is dropped. Resolver or
/// join errors degrade the count to 0 without failing the creation.
async fn notify_donors(state: &AppState, request: BloodRequest) -> usize {
    let resolver = RecipientResolver::new(Arc::new(PgDonorDirectory::new(state.pool.clone())));
    let fanout = NotificationFanout::new(
        Arc::new(PgNotificationSink::new(state.pool.clone())),
        Arc::clone(&state.ws_manager),
        state.mailer.clone(),
    );

    let handle = tokio::spawn(async move {
        let address = Address {
            state: request.state.clone(),
            district: request.district.clone(),
            city: request.city.clone(),
        };
        match resolver
            .resolve(request.blood_group, &address, request.user_id)
            .await
        {
            Ok(recipients) => fanout.dispatch(&request, &recipients).await,
            Err(e) => {
                tracing::warn!(request_id = request.id, error = %e, "Donor resolution failed");
                0
            }
        }
    });

    match handle.await {
        Ok(sent) => sent,
        Err(e) => {
            tracing::warn!(error = %e, "Fanout task failed");
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/blood-requests
///
/// Paginated listing, newest first, with optional status and blood group
/// filters.
pub async fn list_blood_requests(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (page, limit, offset) = page_params(params.page, params.limit);
    let blood_group = parse_blood_group(params.blood_group)?;

    let requests =
        BloodRequestRepo::list(&state.pool, params.status, blood_group, limit, offset).await?;
    let total = BloodRequestRepo::count(&state.pool, params.status, blood_group).await?;

    Ok(Json(serde_json::json!({
        "data": Paginated::new(requests, total, page, limit)
    })))
}

/// GET /api/v1/blood-requests/mine
///
/// Paginated listing of the authenticated user's own requests.
pub async fn list_my_blood_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (page, limit, offset) = page_params(params.page, params.limit);

    let requests =
        BloodRequestRepo::list_for_user(&state.pool, auth.user_id, limit, offset).await?;
    let total = BloodRequestRepo::count_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": Paginated::new(requests, total, page, limit)
    })))
}

/// GET /api/v1/blood-requests/{id}
///
/// Request detail with the requester's directory entry and the volunteer
/// list. Volunteer contact fields are redacted for everyone but the
/// requester unless the volunteer opted in.
pub async fn get_blood_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let request = find_request(&state, id).await?;
    let requester = UserRepo::find_by_id(&state.pool, request.user_id).await?;

    let volunteers = BloodRequestRepo::list_volunteer_details(&state.pool, id).await?;
    let volunteers: Vec<_> = if auth.user_id == request.user_id {
        volunteers
    } else {
        volunteers.into_iter().map(|v| v.redacted()).collect()
    };

    Ok(Json(serde_json::json!({
        "data": {
            "bloodRequest": request,
            "requester": requester,
            "volunteers": volunteers,
        }
    })))
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// PUT /api/v1/blood-requests/{id}
///
/// Partial update of mutable fields. Owner only.
pub async fn update_blood_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBloodRequest>,
) -> AppResult<Json<DataResponse<BloodRequest>>> {
    let existing = find_request(&state, id).await?;
    require_owner(&existing, auth.user_id)?;

    let updated = BloodRequestRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BloodRequest",
            id,
        }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// PUT /api/v1/blood-requests/{id}/status
///
/// Forward-only status transition. Owner only; transitions out of a
/// terminal state are rejected with 409.
pub async fn set_blood_request_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<DataResponse<BloodRequest>>> {
    let existing = find_request(&state, id).await?;
    require_owner(&existing, auth.user_id)?;

    if !existing.status.can_transition_to(input.status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Cannot transition request from {} to {}",
            existing.status, input.status
        ))));
    }

    let updated = BloodRequestRepo::set_status(&state.pool, id, input.status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BloodRequest",
            id,
        }))?;
    tracing::info!(request_id = id, status = %updated.status, "Blood request status changed");

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/blood-requests/{id}
///
/// Owner only. Returns 204 on success.
pub async fn delete_blood_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = find_request(&state, id).await?;
    require_owner(&existing, auth.user_id)?;

    BloodRequestRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Volunteers
// ---------------------------------------------------------------------------

/// POST /api/v1/blood-requests/{id}/volunteer
///
/// Append the authenticated user as a volunteer. Requesters cannot
/// volunteer on their own request, and a user may volunteer only once.
pub async fn volunteer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<VolunteerInput>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state, id).await?;

    if request.user_id == auth.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot volunteer on your own request".into(),
        )));
    }
    if BloodRequestRepo::is_volunteer(&state.pool, id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "You have already volunteered on this request".into(),
        )));
    }

    BloodRequestRepo::add_volunteer(&state.pool, id, auth.user_id, input.can_share_details)
        .await?;
    tracing::info!(request_id = id, user_id = auth.user_id, "Volunteer added");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": { "volunteered": true } })),
    ))
}

/// PUT /api/v1/blood-requests/{id}/volunteer
///
/// Update the authenticated volunteer's sharing preference.
pub async fn set_volunteer_preference(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<VolunteerPreferenceInput>,
) -> AppResult<impl IntoResponse> {
    find_request(&state, id).await?;

    let updated =
        BloodRequestRepo::set_volunteer_sharing(&state.pool, id, auth.user_id, input.can_share_details)
            .await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Volunteer",
            id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_request(state: &AppState, id: DbId) -> AppResult<BloodRequest> {
    BloodRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BloodRequest",
            id,
        }))
}

fn require_owner(request: &BloodRequest, user_id: DbId) -> AppResult<()> {
    if request.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the requester may modify this request".into(),
        )));
    }
    Ok(())
}
