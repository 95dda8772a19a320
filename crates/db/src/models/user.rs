//! User directory entities.
//!
//! The notification core only reads this table: it matches donors by blood
//! group and location. Registration and profile editing live elsewhere.

use bloodbridge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::BloodGroup;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub state: String,
    pub district: String,
    pub city: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Projection returned by donor lookups: just enough to notify someone.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct DonorContact {
    pub id: DbId,
    pub email: String,
}
