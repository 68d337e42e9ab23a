//! Processor trait: what the worker does with each dequeued job.

use async_trait::async_trait;

/// Handles one dequeued job.
///
/// By the time a processor sees a job the message has already been
/// acknowledged, so returning an error does not requeue anything; the
/// worker logs the failure and moves on. Any retry policy (and there is
/// one, for email delivery) lives inside the processor.
#[async_trait]
pub trait Processor<J>: Send + Sync {
    /// Process a job. Errors are terminal for the message.
    async fn process(&self, job: J) -> eyre::Result<()>;

    /// Processor name, for logging.
    fn name(&self) -> &'static str;
}

// Lets callers share one processor between the worker and their own
// handles (call counters in tests, metrics elsewhere).
#[async_trait]
impl<J, P> Processor<J> for std::sync::Arc<P>
where
    J: Send + 'static,
    P: Processor<J> + ?Sized,
{
    async fn process(&self, job: J) -> eyre::Result<()> {
        (**self).process(job).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// A processor that accepts everything. For tests.
#[derive(Debug, Clone, Default)]
pub struct NoOpProcessor;

#[async_trait]
impl<J: Send + 'static> Processor<J> for NoOpProcessor {
    async fn process(&self, _job: J) -> eyre::Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop_processor"
    }
}

/// A processor that rejects everything. For tests.
#[derive(Debug, Clone)]
pub struct FailingProcessor {
    message: String,
}

impl FailingProcessor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl<J: Send + 'static> Processor<J> for FailingProcessor {
    async fn process(&self, _job: J) -> eyre::Result<()> {
        Err(eyre::eyre!(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing_processor"
    }
}
