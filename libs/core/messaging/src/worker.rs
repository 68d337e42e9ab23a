//! The dispatch loop: pull, ack, decode, process.

use crate::config::WorkerConfig;
use crate::consumer::{PullConsumer, QueuedMessage};
use crate::error::QueueError;
use crate::processor::Processor;
use crate::trace::TraceContext;
use async_nats::jetstream::Context;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, info_span, Instrument};

/// Pull-based batch worker.
///
/// One instance owns one durable subscription and runs one sequential
/// processing loop. Messages inside a batch are handled strictly in
/// fetch order; each is acknowledged *before* it is decoded or
/// processed, which commits consume-once semantics at the broker and
/// makes every later failure terminal for that message.
pub struct Worker<J, P> {
    consumer: PullConsumer,
    processor: Arc<P>,
    _marker: PhantomData<fn(J)>,
}

impl<J, P> Worker<J, P>
where
    J: DeserializeOwned + Send + 'static,
    P: Processor<J>,
{
    pub fn new(jetstream: Context, processor: P, config: WorkerConfig) -> Self {
        Self {
            consumer: PullConsumer::new(jetstream, config),
            processor: Arc::new(processor),
            _marker: PhantomData,
        }
    }

    fn config(&self) -> &WorkerConfig {
        self.consumer.config()
    }

    /// Run until the shutdown flag flips.
    ///
    /// Failing to bind the subscription is fatal for this instance; the
    /// error propagates to whoever spawned the task. Once running, the
    /// loop only exits through the shutdown flag, which is checked at
    /// the top of each iteration. A fetch already in flight is allowed
    /// to finish; cancellation is cooperative, not preemptive.
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> Result<(), QueueError> {
        let subscription = self.consumer.subscribe().await?;

        info!(
            stream = %self.config().stream_name,
            consumer = %self.config().durable_name,
            processor = %self.processor.name(),
            "Pull subscription ready, consuming"
        );

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal observed, draining consumer");
                break;
            }

            // An empty batch after the fetch window expires is the idle
            // path, not an error. Real fetch errors are logged and the
            // loop carries on without backoff.
            let batch = match self.consumer.fetch(&subscription).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(error = %e, "Failed to fetch batch");
                    continue;
                }
            };

            for message in batch {
                self.handle_message(message).await;
            }
        }

        info!("Consumer stopped");
        Ok(())
    }

    /// Handle one fetched message: trace span, ack, decode, process.
    ///
    /// Every exit path past the ack drops the message for good, so each
    /// failure is logged with the propagated trace id before returning.
    async fn handle_message(&self, message: QueuedMessage) {
        let trace = message
            .headers()
            .and_then(TraceContext::extract)
            .map(|ctx| ctx.child())
            .unwrap_or_else(TraceContext::generate);

        let span = info_span!("event_processing", trace_id = %trace.trace_id);

        async {
            let sequence = message.sequence();

            if let Err(e) = message.ack().await {
                error!(error = %e, sequence, "Ack failed, skipping message");
                return;
            }

            let job: J = match serde_json::from_slice(message.payload()) {
                Ok(job) => job,
                Err(e) => {
                    error!(error = %e, sequence, "Payload deserialization failed, message dropped");
                    return;
                }
            };

            match self.processor.process(job).await {
                Ok(()) => {
                    info!(sequence, "Notification dispatched");
                }
                Err(e) => {
                    error!(error = %e, sequence, "Processing failed, message dropped");
                }
            }
        }
        .instrument(span)
        .await
    }
}
