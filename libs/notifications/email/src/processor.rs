use async_trait::async_trait;

use messaging::Processor;

use crate::entity::Notification;
use crate::mailer::Mailer;
use crate::sender::EmailSender;

/// Queue-side handler: hands each dequeued notification to the retrying
/// mailer. Delivery failures propagate to the worker, which logs and
/// drops the message.
pub struct EmailProcessor<S> {
    mailer: Mailer<S>,
}

impl<S: EmailSender> EmailProcessor<S> {
    pub fn new(mailer: Mailer<S>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl<S: EmailSender + 'static> Processor<Notification> for EmailProcessor<S> {
    async fn process(&self, notification: Notification) -> eyre::Result<()> {
        self.mailer.deliver(&notification).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email_processor"
    }
}
