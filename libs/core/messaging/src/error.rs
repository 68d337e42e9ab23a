//! Error types for the queue layer.

use thiserror::Error;

/// Errors from the consumer side of the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// JetStream management operation failed
    #[error("JetStream error: {0}")]
    JetStream(String),

    /// Creating the durable pull subscription failed. Fatal for the
    /// worker instance that hit it.
    #[error("failed to create pull subscription: {0}")]
    Subscribe(String),

    /// A batch fetch failed. Non-fatal, the loop continues.
    #[error("batch fetch failed: {0}")]
    Fetch(String),

    /// Acknowledgment failed. The message is skipped; redelivery
    /// cannot be forced once the broker has seen the ack attempt.
    #[error("ack failed: {0}")]
    Ack(String),
}

impl QueueError {
    pub fn jetstream(error: impl std::fmt::Display) -> Self {
        Self::JetStream(error.to_string())
    }

    pub fn subscribe(error: impl std::fmt::Display) -> Self {
        Self::Subscribe(error.to_string())
    }

    pub fn fetch(error: impl std::fmt::Display) -> Self {
        Self::Fetch(error.to_string())
    }

    pub fn ack(error: impl std::fmt::Display) -> Self {
        Self::Ack(error.to_string())
    }
}

/// Errors from the publish path. The split matters to the intake layer:
/// a serialization failure is the caller's fault, a broker failure is
/// ours.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Payload could not be encoded (client error class).
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker rejected or failed the append (server error class).
    /// Not retried at this layer.
    #[error("failed to append to stream: {0}")]
    Broker(String),
}

impl PublishError {
    pub fn broker(error: impl std::fmt::Display) -> Self {
        Self::Broker(error.to_string())
    }

    /// True when the failure maps to a bad-request response rather
    /// than a server error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PublishError::Serialization(_))
    }
}
