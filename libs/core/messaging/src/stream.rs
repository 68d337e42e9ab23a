//! Stream bootstrap.

use crate::config::WorkerConfig;
use crate::error::QueueError;
use async_nats::jetstream::stream::{Config as JsStreamConfig, DiscardPolicy, RetentionPolicy, StorageType};
use async_nats::jetstream::Context;
use tracing::{debug, info};

/// Ensure the notification stream exists, creating it if absent.
///
/// Idempotent: an existing stream is left untouched. The created stream
/// uses work-queue retention (each message is removed once a consumer
/// acknowledges it), discards oldest-first on overflow, evicts anything
/// older than `config.max_age`, and survives restarts on file storage.
pub async fn ensure_stream(jetstream: &Context, config: &WorkerConfig) -> Result<(), QueueError> {
    if jetstream.get_stream(&config.stream_name).await.is_ok() {
        debug!(stream = %config.stream_name, "Stream already exists");
        return Ok(());
    }

    info!(
        stream = %config.stream_name,
        subjects = ?config.subjects,
        "Creating stream"
    );

    jetstream
        .create_stream(JsStreamConfig {
            name: config.stream_name.clone(),
            description: Some("notification stream".to_string()),
            subjects: config.subjects.clone(),
            retention: RetentionPolicy::WorkQueue,
            discard: DiscardPolicy::Old,
            max_age: config.max_age,
            storage: StorageType::File,
            ..Default::default()
        })
        .await
        .map_err(QueueError::jetstream)?;

    info!(stream = %config.stream_name, "Stream created");

    Ok(())
}
