//! Trace-context propagation across the queue boundary.
//!
//! A correlation id pair is carried in message headers (B3 multiple
//! header format) so the consumer-side logs for a message can be linked
//! back to the publish that produced it.

use async_nats::HeaderMap;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "X-B3-TraceId";
pub const SPAN_ID_HEADER: &str = "X-B3-SpanId";
pub const SAMPLED_HEADER: &str = "X-B3-Sampled";

/// A propagated trace identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex chars, stable for the whole request.
    pub trace_id: String,
    /// 16 lowercase hex chars, one per hop.
    pub span_id: String,
}

impl TraceContext {
    /// Mint a fresh context (publish side, or consumer fallback when a
    /// message arrives without headers).
    pub fn generate() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
        }
    }

    /// Same trace, new span. Used on the consumer side so the
    /// processing hop is distinguishable from the publish hop.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
        }
    }

    /// Write this context into outgoing message headers.
    pub fn inject(&self, headers: &mut HeaderMap) {
        headers.insert(TRACE_ID_HEADER, self.trace_id.as_str());
        headers.insert(SPAN_ID_HEADER, self.span_id.as_str());
        headers.insert(SAMPLED_HEADER, "1");
    }

    /// Read a context back out of incoming message headers.
    ///
    /// Returns `None` when no trace id is present; the span id alone is
    /// not enough to correlate anything.
    pub fn extract(headers: &HeaderMap) -> Option<Self> {
        let trace_id = headers.get(TRACE_ID_HEADER)?.as_str().to_string();
        let span_id = headers
            .get(SPAN_ID_HEADER)
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(new_span_id);

        Some(Self { trace_id, span_id })
    }
}

fn new_span_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}
