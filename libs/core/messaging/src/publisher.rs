//! Publish side of the queue.

use crate::config::WorkerConfig;
use crate::error::PublishError;
use crate::trace::TraceContext;
use async_nats::jetstream::Context;
use async_nats::HeaderMap;
use serde::Serialize;
use tracing::debug;

/// Appends serialized notification requests to the durable stream.
///
/// Cheap to clone; safe to share between request handlers and whatever
/// else holds the JetStream context.
#[derive(Clone)]
pub struct Publisher {
    jetstream: Context,
    stream_name: String,
    subject: String,
}

impl Publisher {
    pub fn new(
        jetstream: Context,
        stream_name: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            jetstream,
            stream_name: stream_name.into(),
            subject: subject.into(),
        }
    }

    /// Create a publisher from a worker configuration.
    pub fn from_config(jetstream: Context, config: &WorkerConfig) -> Self {
        Self::new(jetstream, config.stream_name.clone(), config.subject.clone())
    }

    /// Get the stream name.
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Serialize `job`, attach a trace context to the message headers,
    /// and append it to the stream.
    ///
    /// Returns the sequence number the stream assigned, which doubles
    /// as the caller's acknowledgment token. Broker failures are not
    /// retried here; that policy belongs to the caller.
    pub async fn publish<J: Serialize>(&self, job: &J) -> Result<u64, PublishError> {
        let payload = serde_json::to_vec(job)?;

        let trace = TraceContext::generate();
        let mut headers = HeaderMap::new();
        trace.inject(&mut headers);

        let ack = self
            .jetstream
            .publish_with_headers(self.subject.clone(), headers, payload.into())
            .await
            .map_err(PublishError::broker)?
            .await
            .map_err(PublishError::broker)?;

        debug!(
            stream = %self.stream_name,
            subject = %self.subject,
            sequence = ack.sequence,
            trace_id = %trace.trace_id,
            "Notification enqueued"
        );

        Ok(ack.sequence)
    }
}
