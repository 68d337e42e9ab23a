//! Durable pull consumer.

use crate::config::WorkerConfig;
use crate::error::QueueError;
use async_nats::jetstream::consumer::pull::Config as ConsumerConfig;
use async_nats::jetstream::consumer::{AckPolicy, Consumer};
use async_nats::jetstream::Context;
use async_nats::HeaderMap;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// Handle to the named durable pull subscription.
pub type Subscription = Consumer<ConsumerConfig>;

/// Pull side of the queue: binds the durable subscription and fetches
/// bounded batches from it.
pub struct PullConsumer {
    jetstream: Context,
    config: WorkerConfig,
}

impl PullConsumer {
    pub fn new(jetstream: Context, config: WorkerConfig) -> Self {
        Self { jetstream, config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Bind the durable pull subscription, creating it if absent.
    ///
    /// The durable name is derived from the stream name and stable
    /// across restarts, so the broker resumes delivery from the
    /// existing ack floor instead of re-delivering consumed messages.
    pub async fn subscribe(&self) -> Result<Subscription, QueueError> {
        let stream = self
            .jetstream
            .get_stream(&self.config.stream_name)
            .await
            .map_err(QueueError::subscribe)?;

        match stream
            .get_consumer::<ConsumerConfig>(&self.config.durable_name)
            .await
        {
            Ok(consumer) => {
                debug!(consumer = %self.config.durable_name, "Consumer already exists");
                Ok(consumer)
            }
            Err(_) => {
                info!(
                    consumer = %self.config.durable_name,
                    stream = %self.config.stream_name,
                    "Creating consumer"
                );

                stream
                    .create_consumer(ConsumerConfig {
                        durable_name: Some(self.config.durable_name.clone()),
                        name: Some(self.config.durable_name.clone()),
                        ack_policy: AckPolicy::Explicit,
                        filter_subject: self.config.subject.clone(),
                        ..Default::default()
                    })
                    .await
                    .map_err(QueueError::subscribe)
            }
        }
    }

    /// Request one bounded batch.
    ///
    /// Waits up to `fetch_timeout` for up to `batch_size` messages and
    /// returns whatever arrived. An empty batch on timeout is normal,
    /// not an error.
    pub async fn fetch(&self, subscription: &Subscription) -> Result<Vec<QueuedMessage>, QueueError> {
        let mut messages = subscription
            .fetch()
            .max_messages(self.config.batch_size)
            .expires(self.config.fetch_timeout)
            .messages()
            .await
            .map_err(QueueError::fetch)?;

        let mut batch = Vec::new();

        while let Some(message) = messages.next().await {
            match message {
                Ok(message) => batch.push(QueuedMessage { message }),
                Err(e) => {
                    warn!(error = %e, "Error receiving message within batch");
                }
            }
        }

        Ok(batch)
    }
}

/// One message as fetched from the stream, not yet acknowledged.
///
/// The payload stays raw here: acknowledgment happens before
/// deserialization in this pipeline, so decoding is the worker's
/// problem, not the consumer's.
pub struct QueuedMessage {
    message: async_nats::jetstream::Message,
}

impl QueuedMessage {
    /// Raw serialized payload.
    pub fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    /// Message headers, when the publisher attached any.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.message.headers.as_ref()
    }

    /// Stream sequence assigned on append. Zero when the broker did not
    /// return delivery info.
    pub fn sequence(&self) -> u64 {
        self.message
            .info()
            .map(|info| info.stream_sequence)
            .unwrap_or(0)
    }

    /// Acknowledge consumption. Under work-queue retention this deletes
    /// the message from the stream; there is no undo.
    pub async fn ack(&self) -> Result<(), QueueError> {
        self.message.ack().await.map_err(QueueError::ack)
    }
}
