//! Read-only repository for the `users` directory table.

use bloodbridge_core::types::DbId;
use sqlx::PgPool;

use crate::models::blood_request::Address;
use crate::models::enums::BloodGroup;
use crate::models::user::{DonorContact, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, email, phone, blood_group, state, district, city, created_at, updated_at";

/// Geographic granularity of a donor lookup, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationTier {
    City,
    District,
    State,
}

impl LocationTier {
    /// Column name on `users` matched at this tier.
    pub fn column(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::District => "district",
            Self::State => "state",
        }
    }

    /// The address field compared at this tier.
    pub fn value(self, address: &Address) -> &str {
        match self {
            Self::City => &address.city,
            Self::District => &address.district,
            Self::State => &address.state,
        }
    }
}

/// Lookup operations for the user directory. The notification core never
/// mutates this table.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find donors with a matching blood group at one geographic tier,
    /// excluding the requester.
    ///
    /// Each tier is an independent query; callers widen the tier themselves
    /// rather than narrowing a previous result set.
    pub async fn find_donors_at(
        pool: &PgPool,
        tier: LocationTier,
        blood_group: BloodGroup,
        address: &Address,
        exclude: DbId,
    ) -> Result<Vec<DonorContact>, sqlx::Error> {
        let query = format!(
            "SELECT id, email FROM users \
             WHERE blood_group = $1 AND {} = $2 AND id <> $3",
            tier.column()
        );
        sqlx::query_as::<_, DonorContact>(&query)
            .bind(blood_group)
            .bind(tier.value(address))
            .bind(exclude)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_selects_matching_address_field() {
        let address = Address {
            state: "Maharashtra".into(),
            district: "Pune district".into(),
            city: "Pune".into(),
        };
        assert_eq!(LocationTier::City.value(&address), "Pune");
        assert_eq!(LocationTier::District.value(&address), "Pune district");
        assert_eq!(LocationTier::State.value(&address), "Maharashtra");
    }

    #[test]
    fn tier_columns_match_schema() {
        assert_eq!(LocationTier::City.column(), "city");
        assert_eq!(LocationTier::District.column(), "district");
        assert_eq!(LocationTier::State.column(), "state");
    }
}
