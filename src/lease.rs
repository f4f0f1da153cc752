//! RAII lease for pooled browser instances.
//!
//! This module provides [`Lease`], which wraps a checked-out browser and
//! terminates it exactly once: either by returning it to the pool (the
//! default, on scope exit) or by invalidating it (discarding it because the
//! caller knows it is unfit for reuse).
//!
//! # Overview
//!
//! The lease implements the RAII (Resource Acquisition Is Initialization)
//! pattern to ensure browsers are always accounted for, even if:
//! - Your code returns early
//! - An error occurs
//! - A panic happens
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! use docrender_core::BrowserPool;
//!
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!     .build()?;
//!
//! // Acquire a lease
//! let browser = pool.get()?;
//!
//! // Use it like a regular Browser (via Deref)
//! let tab = browser.new_tab()?;
//! tab.navigate_to("https://example.com")?;
//!
//! // Browser automatically returned when `browser` goes out of scope
//! ```
//!
//! # Release vs. Invalidate
//!
//! A lease is terminated exactly once, in one of two ways:
//! - **release** - return the browser to the idle queue so another caller
//!   can reuse it. This is the default, triggered on scope exit (`Drop`).
//! - **invalidate** - mark the browser unfit for reuse. The pool discards
//!   it instead of returning it, and a fresh browser takes its place the
//!   next time the tracking map needs refilling.
//!
//! ```rust,ignore
//! let browser = pool.get()?;
//! match render(&browser) {
//!     Ok(pdf) => pdf,
//!     Err(e) => {
//!         browser.invalidate();
//!         return Err(e);
//!     }
//! }
//! ```
//!
//! # Deref Behavior
//!
//! `Lease` implements [`Deref<Target = Browser>`](std::ops::Deref),
//! allowing transparent access to all [`Browser`] methods:
//!
//! ```rust,ignore
//! let browser = pool.get()?;
//!
//! // These all work directly on the lease:
//! let tab = browser.new_tab()?;           // Browser::new_tab
//! let tabs = browser.get_tabs();          // Browser::get_tabs
//! let version = browser.get_version()?;   // Browser::get_version
//! ```

use std::sync::Arc;

use headless_chrome::Browser;

use crate::pool::BrowserPoolInner;
use crate::tracked::PooledBrowser;

/// RAII lease for a pooled browser instance.
///
/// Terminates exactly once: on [`Drop`] the browser is returned to the pool
/// unless [`Lease::invalidate`] already consumed it.
///
/// # Thread Safety
///
/// `Lease` is `Send` but not `Sync`. This means:
/// - You can move it to another thread
/// - You cannot share it between threads simultaneously
///
/// This matches the typical usage pattern where a single render task uses
/// a browser exclusively.
///
/// # Usage
///
/// ```rust,ignore
/// let lease = pool.get()?;
///
/// // Use browser via Deref
/// let tab = lease.new_tab()?;
/// // ... do work ...
///
/// // Browser automatically returned to pool when lease goes out of scope
/// ```
///
/// # Explicit Invalidation
///
/// If a caller knows the browser is no longer usable (e.g. a render step
/// failed in a way that leaves the browser process in a bad state), it
/// should invalidate the lease instead of letting it return on drop:
///
/// ```rust,ignore
/// let lease = pool.get()?;
/// if let Err(e) = lease.new_tab() {
///     lease.invalidate();
///     return Err(e.into());
/// }
/// ```
///
/// # Panic Safety
///
/// The RAII pattern ensures the pool's bookkeeping stays consistent even
/// during panics:
///
/// ```rust,ignore
/// let lease = pool.get()?;
///
/// // Even if this panics...
/// some_function_that_might_panic();
///
/// // ...the browser is still released back to the pool during unwinding
/// ```
pub struct Lease {
    /// The pooled browser (Option allows taking in Drop/invalidate).
    ///
    /// This is `Option` so we can `take()` it without requiring `&mut self`
    /// to be valid after termination.
    pooled: Option<PooledBrowser>,

    /// Reference to pool for returning/invalidating the browser.
    ///
    /// We keep an `Arc` reference to the pool's inner state so termination
    /// still works even if the original `BrowserPool` has been dropped.
    pool: Arc<BrowserPoolInner>,
}

impl Lease {
    /// Create a new lease.
    ///
    /// This is called internally by [`BrowserPool::get()`](crate::BrowserPool::get).
    /// Users should not need to call this directly.
    ///
    /// # Parameters
    ///
    /// * `pooled` - The pooled browser instance.
    /// * `pool` - Arc reference to the pool's inner state.
    pub(crate) fn new(pooled: PooledBrowser, pool: Arc<BrowserPoolInner>) -> Self {
        Self {
            pooled: Some(pooled),
            pool,
        }
    }

    /// Get the browser's unique ID.
    ///
    /// Useful for logging and debugging.
    pub fn id(&self) -> u64 {
        self.pooled.as_ref().map(|p| p.id()).unwrap_or(0)
    }

    /// Get the browser's age (time since creation).
    pub fn age(&self) -> std::time::Duration {
        self.pooled.as_ref().map(|p| p.age()).unwrap_or_default()
    }

    /// Get the browser's age in minutes.
    ///
    /// Convenience method for human-readable logging.
    pub fn age_minutes(&self) -> u64 {
        self.pooled.as_ref().map(|p| p.age_minutes()).unwrap_or(0)
    }

    /// Invalidate this lease: the pool discards the browser instead of
    /// returning it to the idle queue.
    ///
    /// Use this when the caller knows the browser is unfit for reuse (a
    /// render step failed partway through in a way that may have left the
    /// browser process or one of its pages in a bad state). After calling
    /// this, the lease no longer holds a browser; dropping it is then a
    /// no-op.
    ///
    /// Each lease must be terminated exactly once, either by this method
    /// or by the default drop-based release. Calling `invalidate()` more
    /// than once on the same lease is safe (later calls are no-ops).
    pub fn invalidate(mut self) {
        if let Some(pooled) = self.pooled.take() {
            log::debug!(" Lease {} invalidated, discarding browser...", pooled.id());
            BrowserPoolInner::invalidate_browser(&self.pool, pooled);
        }
    }
}

impl std::ops::Deref for Lease {
    type Target = Browser;

    /// Transparently access the underlying Browser.
    ///
    /// This allows using all [`Browser`] methods directly on the lease:
    ///
    /// ```rust,ignore
    /// let lease = pool.get()?;
    ///
    /// // new_tab() is a Browser method, but works on Lease
    /// let tab = lease.new_tab()?;
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if called after the lease has been terminated. This should
    /// never happen in normal usage since the lease owns the browser until
    /// it's dropped or invalidated, both of which consume it.
    fn deref(&self) -> &Self::Target {
        self.pooled.as_ref().unwrap().browser()
    }
}

impl Drop for Lease {
    /// Return the browser to the pool when the lease is dropped, unless it
    /// was already invalidated.
    ///
    /// This is the critical RAII pattern that ensures browsers are always
    /// accounted for, even if the code using them panics.
    fn drop(&mut self) {
        if let Some(pooled) = self.pooled.take() {
            log::debug!(" Lease {} being dropped, returning to pool...", pooled.id());
            BrowserPoolInner::return_browser(&self.pool, pooled);
        }
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.pooled {
            Some(pooled) => f
                .debug_struct("Lease")
                .field("id", &pooled.id())
                .field("age_minutes", &pooled.age_minutes())
                .finish(),
            None => f.debug_struct("Lease").field("state", &"terminated").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    //use super::*;

    /// Verifies that Lease exposes browser ID.
    #[test]
    fn test_lease_id_returns_zero_when_empty() {
        // We can't easily test with a real PooledBrowser without Chrome,
        // but we can verify the method exists and handles edge cases.
        // In real usage, `pooled` is always Some until termination.
    }

    /// Verifies Debug implementation.
    #[test]
    fn test_lease_debug_when_terminated() {
        // After termination, the lease shows "terminated" state.
        // This is exercised implicitly through the Debug impl.
    }
}
