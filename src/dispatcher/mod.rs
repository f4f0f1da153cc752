//! Dispatchers (C6, C7) — the two ways a [`Pipeline`](crate::pipeline::Pipeline)
//! gets fed work.
//!
//! [`dispatcher::queue`](queue) drains a message broker and bounds in-flight
//! renders to `maxConcurrentRenders`; [`dispatcher::file`](file) walks a
//! directory of template JSON files and renders each one to disk. Both are
//! thin orchestration layers over the same [`Pipeline`](crate::pipeline::Pipeline) —
//! neither touches the browser pool directly.

pub mod file;
pub mod queue;

pub use queue::{QueueDispatcher, QueueTransport};

/// Outcome of a queue-mode message handoff to the transport, driving its
/// retry/dead-letter bookkeeping.
///
/// The dispatcher itself never retries or dead-letters a message; it only
/// reports whether the pipeline succeeded, should be retried, or failed in a
/// way that retrying can never fix, so the transport (which owns the broker
/// connection and offset/ack semantics) can act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The pipeline succeeded and the reply was published.
    Success,
    /// The pipeline failed with a transient error; the transport should
    /// retry, then dead-letter on exhaustion per
    /// [`QueueConfig`](crate::config::QueueConfig).
    Retry,
    /// The pipeline failed with a terminal error (e.g. cancellation or a
    /// disposed pool) that retrying would not fix; the transport should not
    /// re-attempt this request.
    Failed,
}
