//! Cooperative cancellation signal threaded through every suspending boundary.
//!
//! Rather than using exceptions-for-control or `tokio::select!` sprinkled
//! throughout every component, every operation that may suspend (pool
//! acquire, page load, PDF generation) accepts an explicit [`CancelSignal`]
//! and checks it at well-defined points. This mirrors the pool's existing
//! use of an `Arc<AtomicBool>` for shutdown signaling, generalised into a
//! small reusable type.
//!
//! # Example
//!
//! ```rust
//! use docrender_core::cancel::CancelSignal;
//!
//! let signal = CancelSignal::new();
//! assert!(!signal.is_cancelled());
//!
//! signal.cancel();
//! assert!(signal.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply-clonable, shareable cancellation flag.
///
/// Cloning a [`CancelSignal`] shares the same underlying flag; triggering
/// [`cancel()`](Self::cancel) on any clone is observed by all of them.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Create a new, not-yet-cancelled signal.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A signal that is permanently not cancelled, for call sites that don't
    /// need a caller-supplied signal (e.g. file-mode batches without an
    /// external cancellation concept).
    pub fn none() -> Self {
        Self::new()
    }

    /// Trigger cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_not_cancelled() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn test_cancel_is_observed() {
        let signal = CancelSignal::new();
        signal.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let signal = CancelSignal::new();
        signal.cancel();
        signal.cancel();
        assert!(signal.is_cancelled());
    }
}
