//! Round-trip tests against a real NATS server with JetStream.
//!
//! Requires Docker (testcontainers).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_nats::jetstream::stream::RetentionPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use messaging::{
    ensure_stream, Processor, Publisher, PullConsumer, Worker, WorkerConfig, SPAN_ID_HEADER,
    TRACE_ID_HEADER,
};
use test_utils::TestNats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TestJob {
    id: u32,
    payload: String,
}

fn test_job(id: u32) -> TestJob {
    TestJob {
        id,
        payload: format!("job-{id}"),
    }
}

fn test_config(stream_name: &str) -> WorkerConfig {
    WorkerConfig::new(stream_name).with_fetch_timeout(Duration::from_millis(500))
}

struct CaptureProcessor {
    jobs: Mutex<Vec<TestJob>>,
    count: AtomicUsize,
}

impl CaptureProcessor {
    fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Processor<TestJob> for CaptureProcessor {
    async fn process(&self, job: TestJob) -> eyre::Result<()> {
        self.jobs.lock().unwrap().push(job);
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "capture_processor"
    }
}

#[tokio::test]
async fn stream_creation_is_idempotent() {
    let nats = TestNats::new().await;
    let jetstream = nats.jetstream();
    let config = test_config("IDEMPOTENT_TEST");

    ensure_stream(&jetstream, &config).await.unwrap();
    ensure_stream(&jetstream, &config).await.unwrap();

    let mut stream = jetstream.get_stream(&config.stream_name).await.unwrap();
    let info = stream.info().await.unwrap();
    assert_eq!(info.config.retention, RetentionPolicy::WorkQueue);
    assert_eq!(info.config.subjects, vec!["IDEMPOTENT_TEST.*".to_string()]);
    assert_eq!(info.config.max_age, Duration::from_secs(24 * 60 * 60));
}

#[tokio::test]
async fn publish_then_fetch_round_trip() {
    let nats = TestNats::new().await;
    let jetstream = nats.jetstream();
    let config = test_config("ROUND_TRIP_TEST");

    ensure_stream(&jetstream, &config).await.unwrap();

    let publisher = Publisher::from_config(jetstream.clone(), &config);
    let job = test_job(1);
    let sequence = publisher.publish(&job).await.unwrap();
    assert!(sequence > 0);

    let consumer = PullConsumer::new(jetstream, config);
    let subscription = consumer.subscribe().await.unwrap();
    let batch = consumer.fetch(&subscription).await.unwrap();
    assert_eq!(batch.len(), 1);

    let message = &batch[0];
    assert_eq!(message.sequence(), sequence);

    let headers = message.headers().expect("trace headers attached on publish");
    let trace_id = headers.get(TRACE_ID_HEADER).expect("trace id header");
    assert_eq!(trace_id.as_str().len(), 32);
    assert!(headers.get(SPAN_ID_HEADER).is_some());

    let decoded: TestJob = serde_json::from_slice(message.payload()).unwrap();
    assert_eq!(decoded, job);

    message.ack().await.unwrap();
}

#[tokio::test]
async fn acked_messages_are_not_redelivered() {
    let nats = TestNats::new().await;
    let jetstream = nats.jetstream();
    let config = test_config("CONSUME_ONCE_TEST");

    ensure_stream(&jetstream, &config).await.unwrap();

    let publisher = Publisher::from_config(jetstream.clone(), &config);
    publisher.publish(&test_job(1)).await.unwrap();
    publisher.publish(&test_job(2)).await.unwrap();

    let consumer = PullConsumer::new(jetstream.clone(), config.clone());
    let subscription = consumer.subscribe().await.unwrap();

    let batch = consumer.fetch(&subscription).await.unwrap();
    assert_eq!(batch.len(), 2);
    for message in &batch {
        message.ack().await.unwrap();
    }

    // Work-queue retention removes acked messages from the stream.
    let batch = consumer.fetch(&subscription).await.unwrap();
    assert!(batch.is_empty());

    let mut stream = jetstream.get_stream(&config.stream_name).await.unwrap();
    assert_eq!(stream.info().await.unwrap().state.messages, 0);
}

#[tokio::test]
async fn worker_processes_batch_and_stops_on_shutdown() {
    let nats = TestNats::new().await;
    let jetstream = nats.jetstream();
    let config = test_config("WORKER_TEST");

    ensure_stream(&jetstream, &config).await.unwrap();

    let publisher = Publisher::from_config(jetstream.clone(), &config);
    for id in 0..3 {
        publisher.publish(&test_job(id)).await.unwrap();
    }

    let processor = Arc::new(CaptureProcessor::new());
    let worker: Worker<TestJob, _> =
        Worker::new(jetstream, Arc::clone(&processor), config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // Wait for all three jobs to come through the loop.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while processor.count.load(Ordering::SeqCst) < 3 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "worker did not process jobs in time"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let mut ids: Vec<u32> = processor.jobs.lock().unwrap().iter().map(|j| j.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[tokio::test]
async fn worker_drops_undecodable_payloads_and_continues() {
    let nats = TestNats::new().await;
    let jetstream = nats.jetstream();
    let config = test_config("POISON_TEST");

    ensure_stream(&jetstream, &config).await.unwrap();

    // Raw publish bypasses the typed publisher to plant a poison payload.
    jetstream
        .publish(config.subject.clone(), "not json".into())
        .await
        .unwrap()
        .await
        .unwrap();

    let publisher = Publisher::from_config(jetstream.clone(), &config);
    publisher.publish(&test_job(7)).await.unwrap();

    let processor = Arc::new(CaptureProcessor::new());
    let worker: Worker<TestJob, _> =
        Worker::new(jetstream.clone(), Arc::clone(&processor), config.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while processor.count.load(Ordering::SeqCst) < 1 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "worker did not process the valid job in time"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(processor.jobs.lock().unwrap().as_slice(), &[test_job(7)]);

    // Both messages were acked up front, so neither remains.
    let mut stream = jetstream.get_stream(&config.stream_name).await.unwrap();
    assert_eq!(stream.info().await.unwrap().state.messages, 0);
}
