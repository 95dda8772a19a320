//! Delivery channel implementations.

pub mod email;

use bloodbridge_core::types::DbId;

use crate::delivery::email::EmailError;

/// Sends a blood request alert to one recipient address.
///
/// Implemented by [`EmailDelivery`](crate::EmailDelivery) over SMTP; the
/// fanout engine holds it as `Arc<dyn Mailer>` so tests can inject a fake.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_blood_request(
        &self,
        to: &str,
        blood_group: &str,
        city: &str,
        request_id: DbId,
    ) -> Result<(), EmailError>;
}
