//! Blood request notification core: recipient resolution and fanout.

pub mod fanout;
pub mod resolver;

pub use fanout::{NotificationFanout, NotificationSink, PgNotificationSink};
pub use resolver::{DonorDirectory, PgDonorDirectory, RecipientResolver};
