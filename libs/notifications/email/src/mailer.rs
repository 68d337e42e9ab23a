//! Bounded-retry delivery on top of an [`EmailSender`].
//!
//! Every attempt is followed by a fixed delay, and the whole sequence is
//! cancellable through the shared shutdown channel. A notification whose
//! attempts run out is dropped by the caller; there is no redelivery.

use std::sync::Arc;
use std::time::Duration;

use eyre::eyre;
use thiserror::Error;
use tokio::sync::watch;

use crate::entity::Notification;
use crate::sender::EmailSender;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery cancelled by shutdown")]
    Cancelled,

    #[error("all {attempts} delivery attempts failed: {last_error}")]
    AttemptsExhausted {
        attempts: u32,
        last_error: eyre::Report,
    },
}

/// Drives an [`EmailSender`] with a fixed retry schedule.
pub struct Mailer<S> {
    sender: Arc<S>,
    policy: RetryPolicy,
    shutdown: watch::Receiver<bool>,
}

impl<S: EmailSender> Mailer<S> {
    pub fn new(sender: Arc<S>, policy: RetryPolicy, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            sender,
            policy,
            shutdown,
        }
    }

    /// Attempts delivery until it succeeds, the attempt budget runs out,
    /// or shutdown is signalled. Shutdown is checked before every attempt
    /// and interrupts the inter-attempt delay.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let mut shutdown = self.shutdown.clone();
        let mut last_error: Option<eyre::Report> = None;

        for attempt in 1..=self.policy.attempts {
            if *shutdown.borrow() {
                return Err(DeliveryError::Cancelled);
            }

            match self.sender.send(notification).await {
                Ok(()) => {
                    tracing::debug!(attempt, "Notification delivered");
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        sender = self.sender.name(),
                        attempt,
                        max_attempts = self.policy.attempts,
                        error = %err,
                        "Delivery attempt failed"
                    );
                    last_error = Some(err);
                }
            }

            if attempt < self.policy.attempts {
                self.wait_or_cancel(&mut shutdown).await?;
            }
        }

        Err(DeliveryError::AttemptsExhausted {
            attempts: self.policy.attempts,
            last_error: last_error.unwrap_or_else(|| eyre!("retry policy allows zero attempts")),
        })
    }

    async fn wait_or_cancel(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DeliveryError> {
        let sleep = tokio::time::sleep(self.policy.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return Err(DeliveryError::Cancelled),
                    Ok(()) => continue,
                    Err(_) => return Err(DeliveryError::Cancelled),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Recipient;
    use crate::sender::MockSender;
    use tokio::time::Instant;

    fn notification() -> Notification {
        Notification {
            from_name: "ops".into(),
            to_list: vec![Recipient {
                email_addr: "a@b.com".into(),
                user_name: "A".into(),
            }],
            subject: "hi".into(),
            body: "hello".into(),
        }
    }

    fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_on_first_attempt() {
        let sender = Arc::new(MockSender::new());
        let (_tx, rx) = channel();
        let mailer = Mailer::new(sender.clone(), RetryPolicy::default(), rx);

        let started = Instant::now();
        mailer.deliver(&notification()).await.unwrap();

        assert_eq!(sender.send_count(), 1);
        assert_eq!(sender.sent().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let sender = Arc::new(MockSender::failing_times(2));
        let (_tx, rx) = channel();
        let mailer = Mailer::new(sender.clone(), RetryPolicy::default(), rx);

        let started = Instant::now();
        mailer.deliver(&notification()).await.unwrap();

        assert_eq!(sender.send_count(), 3);
        assert!(sender.was_sent_to("a@b.com"));
        // Two inter-attempt delays of 2s each.
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_and_reports_last_error() {
        let sender = Arc::new(MockSender::always_failing("relay refused"));
        let (_tx, rx) = channel();
        let mailer = Mailer::new(sender.clone(), RetryPolicy::default(), rx);

        let err = mailer.deliver(&notification()).await.unwrap_err();

        assert_eq!(sender.send_count(), 3);
        match err {
            DeliveryError::AttemptsExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.to_string().contains("relay refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_attempt_skips_sending() {
        let sender = Arc::new(MockSender::new());
        let (tx, rx) = channel();
        tx.send(true).unwrap();
        let mailer = Mailer::new(sender.clone(), RetryPolicy::default(), rx);

        let err = mailer.deliver(&notification()).await.unwrap_err();

        assert!(matches!(err, DeliveryError::Cancelled));
        assert_eq!(sender.send_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_the_retry_delay() {
        let sender = Arc::new(MockSender::always_failing("down"));
        let (tx, rx) = channel();
        let mailer = Mailer::new(sender.clone(), RetryPolicy::default(), rx);

        let handle = tokio::spawn({
            let n = notification();
            async move { mailer.deliver(&n).await }
        });

        // Let the first attempt fail and the delay begin, then signal.
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, DeliveryError::Cancelled));
        assert_eq!(sender.send_count(), 1);
    }
}
