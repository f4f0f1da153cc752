//! Pooled browser with metadata for pool management.
//!
//! This module provides [`PooledBrowser`], which wraps a [`Browser`] instance
//! with the bookkeeping the pool needs to decide when to recycle it.
//!
//! # Overview
//!
//! Each browser tracked by the pool carries:
//! - **Unique ID**: for identification in logs and debugging
//! - **Creation time**: surfaced for observability, no TTL enforcement
//! - **Render count**: incremented on every lease, compared against
//!   `maxRendersPerInstance` to decide recycling
//! - **Last returned time**: used by the idle reaper to find the oldest
//!   idle browsers first
//!
//! # Architecture
//!
//! ```text
//! PooledBrowser
//! ├── id: u64 (unique identifier)
//! ├── browser: Arc<Browser> (shared ownership)
//! ├── render_count: AtomicU64 (recycle threshold tracking)
//! ├── last_returned_at: Mutex<Instant> (idle-reaper ordering)
//! └── created_at: Instant (observability only)
//! ```
//!
//! # Internal Use
//!
//! This struct is used internally by the pool. Callers interact with
//! browsers through [`Lease`](crate::Lease), which derefs to the browser.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use headless_chrome::Browser;

use crate::error::{RenderError, Result};
use crate::traits::Healthcheck;

/// A browser instance with the metadata the pool needs to manage it.
///
/// # Thread Safety
///
/// Uses [`Arc`] for shared ownership; the mutable bits (`render_count`,
/// `last_returned_at`) use atomics/a mutex so a `PooledBrowser` can move
/// freely between the pool's idle queue and its tracking map.
#[derive(Clone)]
pub(crate) struct PooledBrowser {
    /// Globally unique identifier, assigned sequentially.
    id: u64,

    /// The actual headless_chrome Browser instance (ref-counted).
    browser: Arc<Browser>,

    /// Number of renders this instance has served since creation.
    ///
    /// Compared against `maxRendersPerInstance` on return; once it meets
    /// or exceeds the configured threshold the browser is discarded rather
    /// than requeued.
    render_count: Arc<AtomicU64>,

    /// When this browser was last returned to the idle queue.
    ///
    /// `None` while the browser has never been returned (i.e. it is still
    /// on its first lease). The idle reaper sorts idle browsers by this
    /// timestamp, newest first, and discards the oldest ones past
    /// `idleTimeout` while respecting `minSize`.
    last_returned_at: Arc<Mutex<Option<Instant>>>,

    /// Creation timestamp, exposed for observability.
    created_at: Instant,
}

impl PooledBrowser {
    /// Create a new tracked browser with validation.
    ///
    /// Performs an immediate check to ensure the browser is functional
    /// before it enters the pool.
    ///
    /// # Validation Steps
    ///
    /// 1. Creates a test tab
    /// 2. Navigates to a data URL
    /// 3. Closes the tab
    ///
    /// This ensures the browser process is alive and CDP communication works.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BrowserCreation`] if any validation step fails.
    pub(crate) fn new(browser: Browser) -> Result<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let browser = Arc::new(browser);
        let created_at = Instant::now();

        log::debug!(" Validating new browser instance...");

        let tab = browser.new_tab().map_err(|e| {
            log::error!("❌ Browser validation failed at new_tab(): {}", e);
            RenderError::BrowserCreation(e.to_string())
        })?;

        tab.navigate_to("data:text/html,<html></html>")
            .map_err(|e| {
                log::error!("❌ Browser validation failed at navigate_to(): {}", e);
                let _ = tab.close(true);
                RenderError::BrowserCreation(e.to_string())
            })?;

        let _ = tab.close(true);

        log::debug!("✅ Browser validation passed");

        Ok(PooledBrowser {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            browser,
            render_count: Arc::new(AtomicU64::new(0)),
            last_returned_at: Arc::new(Mutex::new(None)),
            created_at,
        })
    }

    /// Get the unique identifier for this browser.
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Get a reference to the underlying browser.
    #[inline]
    pub(crate) fn browser(&self) -> &Arc<Browser> {
        &self.browser
    }

    /// Record that this browser has served another render.
    ///
    /// Returns the new total render count.
    pub(crate) fn record_render(&self) -> u64 {
        self.render_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current render count.
    pub(crate) fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    /// Whether this instance has served at least `max_renders` renders and
    /// should be recycled instead of requeued.
    pub(crate) fn should_recycle(&self, max_renders: Option<u64>) -> bool {
        match max_renders {
            Some(max) => self.render_count() >= max,
            None => false,
        }
    }

    /// Mark this browser as just-returned-to-idle, for idle-reaper ordering.
    pub(crate) fn mark_returned(&self) {
        if let Ok(mut slot) = self.last_returned_at.lock() {
            *slot = Some(Instant::now());
        }
    }

    /// How long this browser has been sitting idle, if it has ever been
    /// returned. `None` means it has never been idle (first lease only).
    pub(crate) fn idle_duration(&self) -> Option<Duration> {
        self.last_returned_at
            .lock()
            .ok()
            .and_then(|slot| *slot)
            .map(|t| t.elapsed())
    }

    /// Get the browser's age (time since creation).
    #[inline]
    pub(crate) fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Get browser age in minutes (for logging).
    #[inline]
    pub(crate) fn age_minutes(&self) -> u64 {
        self.created_at.elapsed().as_secs() / 60
    }

    /// Get the creation timestamp.
    #[inline]
    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }
}

impl Healthcheck for PooledBrowser {
    /// Perform an on-acquire connectivity check by creating and closing a
    /// tab.
    ///
    /// Unlike a periodic keep-alive ping, this runs synchronously as part
    /// of handing out a lease (SPEC_FULL.md §4.2 acquire step 3): if it
    /// fails, the pool discards this instance and tries the next idle
    /// browser or creates a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BrowserCreation`] if tab creation fails.
    fn ping(&self) -> Result<()> {
        log::trace!(" Checking browser {} before handing out a lease...", self.id);

        let tab = self.browser.new_tab().map_err(|e| {
            log::error!("❌ Browser {} failed acquire-time check: {}", self.id, e);
            RenderError::BrowserCreation(e.to_string())
        })?;

        let _ = tab.close(true);
        log::trace!("✅ Browser {} passed acquire-time check", self.id);
        Ok(())
    }
}

impl std::fmt::Debug for PooledBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBrowser")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("age_minutes", &self.age_minutes())
            .field("render_count", &self.render_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_recycle_respects_threshold() {
        let render_count = Arc::new(AtomicU64::new(3));
        let fake = PooledBrowserTestDouble { render_count };
        assert!(fake.should_recycle(Some(3)));
        assert!(!fake.should_recycle(Some(4)));
        assert!(!fake.should_recycle(None));
    }

    #[test]
    fn test_record_render_increments() {
        let counter = AtomicU64::new(0);
        assert_eq!(counter.fetch_add(1, Ordering::SeqCst) + 1, 1);
        assert_eq!(counter.fetch_add(1, Ordering::SeqCst) + 1, 2);
    }

    #[test]
    fn test_age_minutes_calculation() {
        let seconds: u64 = 3700;
        let minutes = seconds / 60;
        assert_eq!(minutes, 61);
        assert_eq!(59u64 / 60, 0);
        assert_eq!(60u64 / 60, 1);
    }

    /// Minimal stand-in exercising the same threshold logic as
    /// `PooledBrowser::should_recycle` without needing a real `Browser`.
    struct PooledBrowserTestDouble {
        render_count: Arc<AtomicU64>,
    }

    impl PooledBrowserTestDouble {
        fn should_recycle(&self, max_renders: Option<u64>) -> bool {
            match max_renders {
                Some(max) => self.render_count.load(Ordering::SeqCst) >= max,
                None => false,
            }
        }
    }
}
