//! Shared test infrastructure for broker-backed integration tests.
//!
//! Provides [`TestNats`], a throwaway NATS container with JetStream
//! enabled. Each test gets its own container; cleanup happens on drop.

mod nats;

pub use nats::TestNats;
