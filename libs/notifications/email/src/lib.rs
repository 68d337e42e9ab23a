//! Email notification domain: the request entity and its validation,
//! the `EmailSender` capability, and the retrying delivery adapter that
//! sits between the queue worker and the SMTP boundary.
//!
//! ```text
//! Notification ──validate──▶ queue ──▶ EmailProcessor
//!                                          │
//!                                          ▼
//!                                   Mailer (bounded retry)
//!                                          │
//!                                          ▼
//!                                  EmailSender (SMTP / mock)
//! ```

mod entity;
mod mailer;
mod processor;
pub mod sender;
mod stream;

pub use entity::{Notification, Recipient, ValidationError, FROM_NAME_MAX};
pub use mailer::{DeliveryError, Mailer, RetryPolicy};
pub use processor::EmailProcessor;
pub use sender::{EmailSender, MockSender, SmtpConfig, SmtpSender};
pub use stream::NotifStream;
