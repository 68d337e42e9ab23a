//! In-memory sender double for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eyre::eyre;

use super::EmailSender;
use crate::entity::Notification;

/// Records every delivery attempt and can be told to fail.
#[derive(Clone, Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<Notification>>>,
    calls: Arc<AtomicU32>,
    fail_first: Arc<AtomicU32>,
    always_fail: bool,
    failure_message: String,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the first `n` attempts, then succeeds.
    pub fn failing_times(n: u32) -> Self {
        Self {
            fail_first: Arc::new(AtomicU32::new(n)),
            failure_message: "simulated transport failure".to_string(),
            ..Self::default()
        }
    }

    /// Fails every attempt.
    pub fn always_failing(message: &str) -> Self {
        Self {
            always_fail: true,
            failure_message: message.to_string(),
            ..Self::default()
        }
    }

    /// Number of send attempts observed, including failed ones.
    pub fn send_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Notifications that were accepted.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn was_sent_to(&self, email_addr: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.to_list.iter().any(|r| r.email_addr == email_addr))
    }
}

#[async_trait]
impl EmailSender for MockSender {
    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.always_fail {
            return Err(eyre!(self.failure_message.clone()));
        }

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(eyre!(self.failure_message.clone()));
        }

        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
