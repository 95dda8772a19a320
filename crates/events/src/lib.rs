//! External delivery channels for BloodBridge notifications.
//!
//! Currently a single channel: best-effort SMTP email via [`EmailDelivery`].
//! The [`Mailer`] trait is the seam the fanout engine depends on, so tests
//! can substitute a recording implementation.

pub mod delivery;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::Mailer;
