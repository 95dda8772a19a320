//! Repository for the `blood_requests` table and its volunteers.

use bloodbridge_core::types::DbId;
use sqlx::PgPool;

use crate::models::blood_request::{
    BloodRequest, CreateBloodRequest, UpdateBloodRequest, VolunteerDetail,
    DEFAULT_REQUEST_MESSAGE,
};
use crate::models::enums::{BloodGroup, RequestStatus};

/// Column list for `blood_requests` queries.
const COLUMNS: &str = "id, user_id, blood_group, urgency, message, contact_phone, \
                       contact_email, status, state, district, city, created_at, updated_at";

/// Provides CRUD operations for blood requests.
pub struct BloodRequestRepo;

impl BloodRequestRepo {
    /// Insert a new blood request for `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateBloodRequest,
    ) -> Result<BloodRequest, sqlx::Error> {
        let message = input
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_REQUEST_MESSAGE);
        let query = format!(
            "INSERT INTO blood_requests \
                (user_id, blood_group, urgency, message, contact_phone, contact_email, \
                 state, district, city) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(user_id)
            .bind(input.blood_group)
            .bind(input.urgency)
            .bind(message)
            .bind(&input.contact_details.phone)
            .bind(&input.contact_details.email)
            .bind(&input.address.state)
            .bind(&input.address.district)
            .bind(&input.address.city)
            .fetch_one(pool)
            .await
    }

    /// Find a blood request by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BloodRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blood_requests WHERE id = $1");
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List blood requests, newest first, optionally filtered by status
    /// and/or blood group.
    pub async fn list(
        pool: &PgPool,
        status: Option<RequestStatus>,
        blood_group: Option<BloodGroup>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BloodRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blood_requests \
             WHERE ($1::request_status IS NULL OR status = $1) \
               AND ($2::blood_group IS NULL OR blood_group = $2) \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(status)
            .bind(blood_group)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count blood requests matching the same filters as [`Self::list`].
    pub async fn count(
        pool: &PgPool,
        status: Option<RequestStatus>,
        blood_group: Option<BloodGroup>,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blood_requests \
             WHERE ($1::request_status IS NULL OR status = $1) \
               AND ($2::blood_group IS NULL OR blood_group = $2)",
        )
        .bind(status)
        .bind(blood_group)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// List a single user's blood requests, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BloodRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blood_requests \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a single user's blood requests.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM blood_requests WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count.unwrap_or(0))
    }

    /// Update a blood request. Only non-`None` fields in `input` are applied;
    /// contact details and address are replaced as whole groups.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBloodRequest,
    ) -> Result<Option<BloodRequest>, sqlx::Error> {
        let contact_phone = input.contact_details.as_ref().map(|c| c.phone.clone());
        let contact_email = input.contact_details.as_ref().and_then(|c| c.email.clone());
        let query = format!(
            "UPDATE blood_requests SET \
                blood_group = COALESCE($2, blood_group), \
                urgency = COALESCE($3, urgency), \
                message = COALESCE($4, message), \
                contact_phone = COALESCE($5, contact_phone), \
                contact_email = CASE WHEN $5 IS NULL THEN contact_email ELSE $6 END, \
                state = COALESCE($7, state), \
                district = COALESCE($8, district), \
                city = COALESCE($9, city), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .bind(input.blood_group)
            .bind(input.urgency)
            .bind(&input.message)
            .bind(contact_phone)
            .bind(contact_email)
            .bind(input.address.as_ref().map(|a| a.state.clone()))
            .bind(input.address.as_ref().map(|a| a.district.clone()))
            .bind(input.address.as_ref().map(|a| a.city.clone()))
            .fetch_optional(pool)
            .await
    }

    /// Set the status of a blood request, returning the updated row.
    ///
    /// Transition rules are enforced by the caller via
    /// [`RequestStatus::can_transition_to`].
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: RequestStatus,
    ) -> Result<Option<BloodRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE blood_requests SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a blood request. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blood_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Volunteers
    // -----------------------------------------------------------------------

    /// Whether `user_id` already volunteered on `request_id`.
    pub async fn is_volunteer(
        pool: &PgPool,
        request_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blood_request_volunteers \
             WHERE request_id = $1 AND user_id = $2",
        )
        .bind(request_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Append a volunteer to a request. Volunteers are never removed.
    pub async fn add_volunteer(
        pool: &PgPool,
        request_id: DbId,
        user_id: DbId,
        can_share_details: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO blood_request_volunteers (request_id, user_id, can_share_details) \
             VALUES ($1, $2, $3)",
        )
        .bind(request_id)
        .bind(user_id)
        .bind(can_share_details)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update a volunteer's sharing preference. Returns `true` if the
    /// volunteer row exists.
    pub async fn set_volunteer_sharing(
        pool: &PgPool,
        request_id: DbId,
        user_id: DbId,
        can_share_details: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE blood_request_volunteers SET can_share_details = $3 \
             WHERE request_id = $1 AND user_id = $2",
        )
        .bind(request_id)
        .bind(user_id)
        .bind(can_share_details)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List volunteers on a request with their directory contact fields.
    pub async fn list_volunteer_details(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<VolunteerDetail>, sqlx::Error> {
        sqlx::query_as::<_, VolunteerDetail>(
            "SELECT v.user_id, u.name, u.phone, u.email, v.can_share_details \
             FROM blood_request_volunteers v \
             JOIN users u ON u.id = v.user_id \
             WHERE v.request_id = $1 \
             ORDER BY v.created_at",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
    }
}
