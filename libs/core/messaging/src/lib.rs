//! Durable notification queue over NATS JetStream.
//!
//! This library is the asynchronous boundary of the notification service:
//! the intake side appends validated requests to a durable, work-queue
//! retained stream; an independent consumer loop pulls bounded batches
//! and drives delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌─────────────────────┐     ┌────────────────┐
//! │   Publisher    │────▶│   NATS JetStream    │────▶│     Worker     │
//! │ (HTTP intake)  │     │ (work-queue stream) │     │  (pull batch)  │
//! └────────────────┘     └─────────────────────┘     └────────────────┘
//!                                                            │
//!                                                            ▼
//!                                                    ┌────────────────┐
//!                                                    │   Processor    │
//!                                                    │ (your delivery)│
//!                                                    └────────────────┘
//! ```
//!
//! # Semantics
//!
//! - **At-most-once past the queue**: the worker acknowledges every
//!   fetched message *before* processing it. Work-queue retention then
//!   drops the message from the stream, so a processing failure is
//!   terminal (logged, never redelivered). Delivery retries belong to
//!   the [`Processor`], in-process.
//! - **Trace continuity**: [`Publisher::publish`] injects a
//!   [`TraceContext`] into the message headers; the worker extracts it
//!   and tags every log line for that message with the same trace id.
//! - **Cooperative shutdown**: [`Worker::run`] observes a
//!   `tokio::sync::watch` flag between iterations and returns once it
//!   flips, without interrupting an in-flight fetch.

mod config;
mod consumer;
mod error;
mod processor;
mod publisher;
mod stream;
mod trace;
mod worker;

pub use config::{StreamConfig, WorkerConfig};
pub use consumer::{PullConsumer, QueuedMessage, Subscription};
pub use error::{PublishError, QueueError};
pub use processor::{FailingProcessor, NoOpProcessor, Processor};
pub use publisher::Publisher;
pub use stream::ensure_stream;
pub use trace::{TraceContext, SAMPLED_HEADER, SPAN_ID_HEADER, TRACE_ID_HEADER};
pub use worker::Worker;
