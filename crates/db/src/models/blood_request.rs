//! Blood request entities and DTOs.

use bloodbridge_core::error::CoreError;
use bloodbridge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::enums::{BloodGroup, RequestStatus, Urgency};

/// Message stored when the requester does not provide one.
pub const DEFAULT_REQUEST_MESSAGE: &str = "Urgent blood required";

/// A row from the `blood_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: DbId,
    pub user_id: DbId,
    pub blood_group: BloodGroup,
    pub urgency: Urgency,
    pub message: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub status: RequestStatus,
    pub state: String,
    pub district: String,
    pub city: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Geographic location of a request or donor, narrowest field last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub state: String,
    pub district: String,
    pub city: String,
}

/// Phone is mandatory so requesters stay reachable; email is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDetails {
    pub phone: String,
    pub email: Option<String>,
}

/// DTO for creating a blood request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBloodRequest {
    pub blood_group: BloodGroup,
    pub urgency: Urgency,
    pub message: Option<String>,
    pub contact_details: ContactDetails,
    pub address: Address,
}

impl CreateBloodRequest {
    /// Reject blank required fields before any persistence or fanout work.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.contact_details.phone.trim().is_empty() {
            return Err(CoreError::Validation("Contact phone is required".into()));
        }
        for (field, value) in [
            ("state", &self.address.state),
            ("district", &self.address.district),
            ("city", &self.address.city),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("Address {field} is required")));
            }
        }
        Ok(())
    }
}

/// DTO for updating a blood request. Only non-`None` fields are applied;
/// `contact_details` and `address` replace the whole group when present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBloodRequest {
    pub blood_group: Option<BloodGroup>,
    pub urgency: Option<Urgency>,
    pub message: Option<String>,
    pub contact_details: Option<ContactDetails>,
    pub address: Option<Address>,
}

/// A volunteer on a request, joined with directory contact fields.
///
/// `phone` and `email` are `None` when the volunteer opted out of sharing
/// and the viewer is not the requester.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerDetail {
    pub user_id: DbId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub can_share_details: bool,
}

impl VolunteerDetail {
    /// Strip contact fields unless the volunteer agreed to share them.
    pub fn redacted(mut self) -> Self {
        if !self.can_share_details {
            self.phone = None;
            self.email = None;
        }
        self
    }
}

/// DTO for volunteering on a request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerInput {
    #[serde(default = "default_can_share")]
    pub can_share_details: bool,
}

fn default_can_share() -> bool {
    true
}

/// DTO for changing a volunteer's sharing preference.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerPreferenceInput {
    pub can_share_details: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{BloodGroup, Urgency};

    fn input() -> CreateBloodRequest {
        CreateBloodRequest {
            blood_group: BloodGroup::BPositive,
            urgency: Urgency::High,
            message: None,
            contact_details: ContactDetails {
                phone: "9876543210".into(),
                email: None,
            },
            address: Address {
                state: "Maharashtra".into(),
                district: "Pune".into(),
                city: "Pune".into(),
            },
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn blank_phone_is_rejected() {
        let mut req = input();
        req.contact_details.phone = "  ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_city_is_rejected() {
        let mut req = input();
        req.address.city = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn redaction_strips_contact_fields_when_opted_out() {
        let v = VolunteerDetail {
            user_id: 1,
            name: "Asha".into(),
            phone: Some("123".into()),
            email: Some("asha@example.com".into()),
            can_share_details: false,
        };
        let redacted = v.redacted();
        assert!(redacted.phone.is_none());
        assert!(redacted.email.is_none());
    }

    #[test]
    fn redaction_keeps_contact_fields_when_shared() {
        let v = VolunteerDetail {
            user_id: 1,
            name: "Asha".into(),
            phone: Some("123".into()),
            email: None,
            can_share_details: true,
        };
        let kept = v.redacted();
        assert_eq!(kept.phone.as_deref(), Some("123"));
    }
}
