//! Stream and worker configuration.

use std::time::Duration;

/// Stream definition trait (type-safe constants).
///
/// Implement this once per logical stream; subject and consumer names
/// are derived from the stream name so the publish side and the consume
/// side can never drift apart, and so the durable consumer keeps its
/// ack state across restarts.
///
/// # Example
///
/// ```rust
/// use messaging::StreamConfig;
///
/// struct NotifStream;
///
/// impl StreamConfig for NotifStream {
///     const STREAM_NAME: &'static str = "NOTIFS";
/// }
///
/// assert_eq!(NotifStream::subject(), "NOTIFS.send");
/// assert_eq!(NotifStream::durable_name(), "NOTIFS_pullSub");
/// ```
pub trait StreamConfig {
    /// JetStream stream name (e.g. "NOTIFS")
    const STREAM_NAME: &'static str;

    /// Message age after which the stream evicts regardless of consumption.
    const MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

    /// Routing subject messages are published under.
    fn subject() -> String {
        format!("{}.send", Self::STREAM_NAME)
    }

    /// Durable pull-consumer name. Must be stable across restarts.
    fn durable_name() -> String {
        format!("{}_pullSub", Self::STREAM_NAME)
    }

    /// Subject pattern the stream captures.
    fn subjects() -> Vec<String> {
        vec![format!("{}.*", Self::STREAM_NAME)]
    }
}

/// Runtime configuration for one worker instance.
///
/// Explicit struct rather than process-wide constants so tests can
/// shrink the batch window and timeouts without touching global state.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// JetStream stream name
    pub stream_name: String,

    /// Subject pattern the stream captures
    pub subjects: Vec<String>,

    /// Routing subject for publish and consumer filtering
    pub subject: String,

    /// Durable consumer name
    pub durable_name: String,

    /// Maximum messages per pull batch
    pub batch_size: usize,

    /// How long a pull request waits before returning (possibly empty)
    pub fetch_timeout: Duration,

    /// Stream eviction age
    pub max_age: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("NOTIFS")
    }
}

impl WorkerConfig {
    /// Create a configuration with all names derived from the stream name.
    pub fn new(stream_name: impl Into<String>) -> Self {
        let stream_name = stream_name.into();
        Self {
            subjects: vec![format!("{}.*", stream_name)],
            subject: format!("{}.send", stream_name),
            durable_name: format!("{}_pullSub", stream_name),
            stream_name,
            batch_size: 5,
            fetch_timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Create from a [`StreamConfig`] definition.
    pub fn from_stream<S: StreamConfig>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            subjects: S::subjects(),
            subject: S::subject(),
            durable_name: S::durable_name(),
            max_age: S::MAX_AGE,
            ..Self::new(S::STREAM_NAME)
        }
    }

    /// Set the pull batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the pull wait timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the stream eviction age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStream;

    impl StreamConfig for TestStream {
        const STREAM_NAME: &'static str = "TEST_NOTIFS";
    }

    #[test]
    fn names_derive_from_stream_name() {
        let config = WorkerConfig::new("NOTIFS");
        assert_eq!(config.stream_name, "NOTIFS");
        assert_eq!(config.subject, "NOTIFS.send");
        assert_eq!(config.durable_name, "NOTIFS_pullSub");
        assert_eq!(config.subjects, vec!["NOTIFS.*".to_string()]);
    }

    #[test]
    fn config_from_stream() {
        let config = WorkerConfig::from_stream::<TestStream>();
        assert_eq!(config.stream_name, "TEST_NOTIFS");
        assert_eq!(config.subject, "TEST_NOTIFS.send");
        assert_eq!(config.durable_name, "TEST_NOTIFS_pullSub");
        assert_eq!(config.max_age, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn defaults_match_dispatch_policy() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
    }

    #[test]
    fn builder_overrides() {
        let config = WorkerConfig::new("NOTIFS")
            .with_batch_size(2)
            .with_fetch_timeout(Duration::from_millis(250));

        assert_eq!(config.batch_size, 2);
        assert_eq!(config.fetch_timeout, Duration::from_millis(250));
    }
}
