//! Domain enums mapped to PostgreSQL enum types.
//!
//! Each enum derives `sqlx::Type` against the matching `CREATE TYPE` in the
//! initial migration, so repositories can bind and decode them directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ABO/Rh blood group. Serialized with its clinical notation (`"B+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "blood_group")]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    #[sqlx(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    #[sqlx(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    #[sqlx(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    #[sqlx(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    #[sqlx(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    #[sqlx(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    #[sqlx(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    #[sqlx(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// Clinical notation, e.g. `"AB-"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Query strings may arrive with '+' decoded as a space ("B ").
        let normalized = s.replace(' ', "+");
        match normalized.as_str() {
            "A+" => Ok(Self::APositive),
            "A-" => Ok(Self::ANegative),
            "B+" => Ok(Self::BPositive),
            "B-" => Ok(Self::BNegative),
            "AB+" => Ok(Self::AbPositive),
            "AB-" => Ok(Self::AbNegative),
            "O+" => Ok(Self::OPositive),
            "O-" => Ok(Self::ONegative),
            other => Err(format!("Invalid blood group: {other}")),
        }
    }
}

/// How urgently the blood is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "urgency", rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Blood request lifecycle status.
///
/// Transitions are forward-only: a pending request may become completed or
/// rejected; both of those are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
    Rejected,
}

impl RequestStatus {
    /// Whether an explicit transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self == RequestStatus::Pending
            && matches!(next, RequestStatus::Completed | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
pub enum NotificationKind {
    BloodRequest,
    Other,
}

impl NotificationKind {
    /// Wire representation, matching the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BloodRequest => "blood_request",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_group_round_trips_through_str() {
        for s in ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"] {
            let parsed: BloodGroup = s.parse().expect("valid group");
            assert_eq!(parsed.as_str(), s);
        }
    }

    #[test]
    fn blood_group_parse_tolerates_url_decoded_plus() {
        assert_eq!("B ".parse::<BloodGroup>(), Ok(BloodGroup::BPositive));
        assert_eq!("AB ".parse::<BloodGroup>(), Ok(BloodGroup::AbPositive));
    }

    #[test]
    fn blood_group_rejects_unknown_value() {
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn blood_group_serializes_with_clinical_notation() {
        let json = serde_json::to_string(&BloodGroup::AbNegative).unwrap();
        assert_eq!(json, "\"AB-\"");
    }

    #[test]
    fn pending_transitions_forward_only() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn terminal_statuses_do_not_transition() {
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::Pending));
    }
}
