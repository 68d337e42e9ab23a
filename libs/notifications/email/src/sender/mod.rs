//! Delivery boundary. `EmailSender` is the capability the retry layer
//! drives; `SmtpSender` is the production adapter and `MockSender` the
//! test double.

mod mock;
mod smtp;

use async_trait::async_trait;

use crate::entity::Notification;

pub use mock::MockSender;
pub use smtp::{SmtpConfig, SmtpSender};

/// A single delivery attempt against some transport.
///
/// Implementations must not retry internally; bounded retry belongs to
/// [`crate::Mailer`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> eyre::Result<()>;

    /// Adapter name, for logging.
    fn name(&self) -> &'static str;
}
