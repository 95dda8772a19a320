//! Tiered geographic recipient resolution.
//!
//! Donors are looked up at the narrowest geographic tier first (city, then
//! district, then state). Each tier is an independent query; the first tier
//! with any match wins and wider tiers are never consulted.

use std::sync::Arc;

use bloodbridge_core::types::DbId;
use bloodbridge_db::models::blood_request::Address;
use bloodbridge_db::models::enums::BloodGroup;
use bloodbridge_db::models::user::DonorContact;
use bloodbridge_db::repositories::{LocationTier, UserRepo};
use bloodbridge_db::DbPool;

/// Donor directory lookup at one geographic tier.
///
/// The fanout path holds this as `Arc<dyn DonorDirectory>` so tests can
/// inject a fake directory without a database.
#[async_trait::async_trait]
pub trait DonorDirectory: Send + Sync {
    async fn find_donors_at(
        &self,
        tier: LocationTier,
        blood_group: BloodGroup,
        address: &Address,
        exclude: DbId,
    ) -> Result<Vec<DonorContact>, sqlx::Error>;
}

/// Directory backed by the `users` table.
pub struct PgDonorDirectory {
    pool: DbPool,
}

impl PgDonorDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DonorDirectory for PgDonorDirectory {
    async fn find_donors_at(
        &self,
        tier: LocationTier,
        blood_group: BloodGroup,
        address: &Address,
        exclude: DbId,
    ) -> Result<Vec<DonorContact>, sqlx::Error> {
        UserRepo::find_donors_at(&self.pool, tier, blood_group, address, exclude).await
    }
}

/// Tier order, narrowest first.
const TIERS: [LocationTier; 3] = [LocationTier::City, LocationTier::District, LocationTier::State];

/// Resolves the recipient set for a new blood request.
pub struct RecipientResolver {
    directory: Arc<dyn DonorDirectory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn DonorDirectory>) -> Self {
        Self { directory }
    }

    /// Find donors for `blood_group` near `address`, excluding the requester.
    ///
    /// Short-circuits on the first tier with any match; returns an empty set
    /// when no tier matches.
    pub async fn resolve(
        &self,
        blood_group: BloodGroup,
        address: &Address,
        exclude: DbId,
    ) -> Result<Vec<DonorContact>, sqlx::Error> {
        for tier in TIERS {
            let donors = self
                .directory
                .find_donors_at(tier, blood_group, address, exclude)
                .await?;
            if !donors.is_empty() {
                tracing::debug!(
                    ?tier,
                    count = donors.len(),
                    blood_group = %blood_group,
                    "Resolved donors"
                );
                return Ok(donors);
            }
        }

        tracing::debug!(blood_group = %blood_group, "No donors found at any tier");
        Ok(Vec::new())
    }
}
