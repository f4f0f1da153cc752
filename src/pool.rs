//! Browser pool with lifecycle management.
//!
//! This module provides [`BrowserPool`], the main entry point for managing
//! a pool of headless Chrome browsers under a fixed concurrency cap.
//!
//! # Overview
//!
//! The browser pool provides:
//! - **Bounded Concurrency**: a counting semaphore caps concurrent leases at `maxSize`
//! - **On-Acquire Health Checks**: idle browsers are pinged before being handed out
//! - **Idle Reaping**: a background task closes browsers idle past `idleTimeout`,
//!   never dropping below `minSize`
//! - **Render-Count Recycling**: browsers serving too many renders are retired
//! - **Race-Free Design**: careful lock ordering prevents deadlocks
//! - **Graceful Shutdown**: clean termination of the idle reaper
//! - **RAII Pattern**: automatic return of browsers to the pool via [`Lease`]'s `Drop`
//!
//! # Architecture
//!
//! ```text
//! BrowserPool
//!   ├─ BrowserPoolInner (shared state)
//!   │   ├─ permits: Semaphore         (maxSize permits)
//!   │   ├─ idle: VecDeque<PooledBrowser>   (FIFO, ready to lease)
//!   │   ├─ tracked: HashMap<id, PooledBrowser>  (idle + active)
//!   │   └─ active_count: AtomicUsize
//!   └─ reaper_handle: Option<JoinHandle>  (idle-reaping thread)
//! ```
//!
//! # Critical Invariants
//!
//! 1. `active_count + idle.len() <= tracked.len() <= max_size`
//! 2. A semaphore permit is held for exactly as long as a lease is outstanding
//! 3. No browser is ever present in `tracked` twice
//! 4. Once shutdown begins, no new lease succeeds
//!
//! # Example
//!
//! ```rust,no_run
//! use docrender_core::{BrowserPool, PoolConfigBuilder, ChromeBrowserFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pool = BrowserPool::builder()
//!         .config(
//!             PoolConfigBuilder::new()
//!                 .max_size(5)
//!                 .min_size(2)
//!                 .build()?
//!         )
//!         .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!         .build()?;
//!
//!     pool.warmup().await?;
//!
//!     {
//!         let browser = pool.get()?;
//!         let tab = browser.new_tab()?;
//!         // ... do work ...
//!     } // browser returned to pool automatically
//!
//!     pool.shutdown_async().await;
//!
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::cancel::CancelSignal;
use crate::config::PoolConfig;
use crate::error::{RenderError, Result};
use crate::factory::BrowserFactory;
use crate::lease::Lease;
use crate::stats::PoolStats;
use crate::traits::Healthcheck;
use crate::tracked::PooledBrowser;

// ============================================================================
// Semaphore
// ============================================================================

/// Outcome of a timed, cancellable semaphore acquire.
enum AcquireOutcome {
    Acquired,
    TimedOut,
    Cancelled,
}

/// A blocking counting semaphore with timeout and cancellation support.
///
/// Built on `Mutex`+`Condvar` rather than `tokio::sync::Semaphore` because
/// [`Lease`] acquisition is a synchronous call used from non-async render
/// code; this follows the same condvar-based wait pattern already used for
/// shutdown signaling elsewhere in this crate.
struct Semaphore {
    permits: Mutex<usize>,
    cvar: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cvar: Condvar::new(),
        }
    }

    /// Wait up to `timeout` for a permit, polling `cancel` between waits.
    ///
    /// On [`AcquireOutcome::Cancelled`] or [`AcquireOutcome::TimedOut`], no
    /// permit is consumed.
    fn acquire_timeout(&self, timeout: Duration, cancel: &CancelSignal) -> AcquireOutcome {
        let deadline = Instant::now() + timeout;
        let mut guard = self.permits.lock().unwrap();

        loop {
            if *guard > 0 {
                *guard -= 1;
                return AcquireOutcome::Acquired;
            }

            if cancel.is_cancelled() {
                return AcquireOutcome::Cancelled;
            }

            let now = Instant::now();
            if now >= deadline {
                return AcquireOutcome::TimedOut;
            }

            // Poll in small slices so cancellation is observed promptly
            // instead of only at the full timeout.
            let slice = (deadline - now).min(Duration::from_millis(100));
            let (g, _timeout_result) = self.cvar.wait_timeout(guard, slice).unwrap();
            guard = g;
        }
    }

    fn release(&self) {
        let mut guard = self.permits.lock().unwrap();
        *guard += 1;
        self.cvar.notify_one();
    }
}

// ============================================================================
// BrowserPoolInner
// ============================================================================

/// Internal shared state for the browser pool.
///
/// This struct contains all shared state and is wrapped in `Arc` for
/// thread-safe sharing between the pool, leases, and the idle-reaper thread.
///
/// # Lock Ordering (CRITICAL)
///
/// Always acquire locks in this order to prevent deadlocks:
/// 1. `tracked` (the full id -> browser map)
/// 2. `idle` (the FIFO of browsers ready for checkout)
///
/// Never hold locks during I/O operations or browser creation.
pub(crate) struct BrowserPoolInner {
    /// Configuration (immutable after creation).
    config: PoolConfig,

    /// Browsers sitting idle, ready for checkout. FIFO: new returns go to
    /// the back, acquire takes from the front.
    idle: Mutex<VecDeque<PooledBrowser>>,

    /// Every browser the pool currently knows about, idle or leased.
    tracked: Mutex<HashMap<u64, PooledBrowser>>,

    /// Outstanding leases right now.
    active_count: AtomicUsize,

    /// Counting semaphore bounding concurrent leases at `config.max_size`.
    permits: Semaphore,

    /// Factory for creating new browser instances.
    factory: Box<dyn BrowserFactory>,

    /// Atomic flag indicating shutdown in progress.
    shutting_down: AtomicBool,

    /// Shutdown signaling mechanism for the idle-reaper thread.
    ///
    /// Tuple of (flag, condvar) allows immediate wake-up on shutdown
    /// instead of waiting for the full reaper interval.
    shutdown_signal: Arc<(Mutex<bool>, Condvar)>,
}

impl BrowserPoolInner {
    /// Create a new browser pool inner state.
    pub(crate) fn new(config: PoolConfig, factory: Box<dyn BrowserFactory>) -> Arc<Self> {
        log::info!(" Initializing browser pool with capacity {}", config.max_size);
        log::debug!(
            " Pool config: min_size={}, acquire_timeout={}s, idle_timeout={:?}, max_renders_per_instance={:?}",
            config.min_size,
            config.acquire_timeout.as_secs(),
            config.idle_timeout,
            config.max_renders_per_instance,
        );

        let permits = Semaphore::new(config.max_size);

        Arc::new(Self {
            config,
            idle: Mutex::new(VecDeque::new()),
            tracked: Mutex::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            permits,
            factory,
            shutting_down: AtomicBool::new(false),
            shutdown_signal: Arc::new((Mutex::new(false), Condvar::new())),
        })
    }

    /// Create a browser directly via the factory and add it to the
    /// tracking map (not yet leased, not yet idle — caller decides which).
    ///
    /// # Errors
    ///
    /// - Returns [`RenderError::PoolDisposed`] if the pool is shutting down.
    /// - Returns whatever the factory or [`PooledBrowser::new`] returns on
    ///   launch/validation failure.
    pub(crate) fn create_and_track(&self) -> Result<PooledBrowser> {
        if self.shutting_down.load(Ordering::Acquire) {
            log::debug!(" Skipping browser creation - pool is shutting down");
            return Err(RenderError::PoolDisposed);
        }

        log::debug!("️ Creating new browser directly via factory...");
        let browser = self.factory.create()?;
        let pooled = PooledBrowser::new(browser)?;

        self.tracked.lock().unwrap().insert(pooled.id(), pooled.clone());
        log::info!("✅ Created new browser with ID {}", pooled.id());
        Ok(pooled)
    }

    /// Acquire a lease: dequeue a healthy idle browser, or create one if the
    /// idle queue is empty or every idle entry fails its acquire-time check.
    ///
    /// Callers must already hold a semaphore permit; on any error this
    /// returns without having incremented `active_count`, so the caller is
    /// responsible for releasing the permit.
    fn acquire_after_permit(self_arc: &Arc<Self>) -> Result<Lease> {
        loop {
            let popped = { self_arc.idle.lock().unwrap().pop_front() };

            let Some(pooled) = popped else {
                break;
            };

            log::debug!(" Testing idle browser {} before handing out a lease...", pooled.id());
            match pooled.ping() {
                Ok(()) => {
                    self_arc.active_count.fetch_add(1, Ordering::SeqCst);
                    log::info!("♻️ Reusing healthy browser {} from idle queue", pooled.id());
                    return Ok(Lease::new(pooled, Arc::clone(self_arc)));
                }
                Err(e) => {
                    log::warn!(
                        "❌ Idle browser {} failed acquire-time check, discarding: {}",
                        pooled.id(),
                        e
                    );
                    self_arc.tracked.lock().unwrap().remove(&pooled.id());
                    // Continue loop to try the next idle browser.
                }
            }
        }

        log::info!("️ Idle queue empty or exhausted, creating new browser");
        let pooled = self_arc.create_and_track()?;
        self_arc.active_count.fetch_add(1, Ordering::SeqCst);
        Ok(Lease::new(pooled, Arc::clone(self_arc)))
    }

    /// Acquire a lease, honoring `acquire_timeout` and `cancel`.
    pub(crate) fn acquire(self_arc: &Arc<Self>, cancel: &CancelSignal) -> Result<Lease> {
        if self_arc.shutting_down.load(Ordering::Acquire) {
            return Err(RenderError::PoolDisposed);
        }

        let waited_since = Instant::now();
        match self_arc.permits.acquire_timeout(self_arc.config.acquire_timeout, cancel) {
            AcquireOutcome::Cancelled => {
                log::debug!(" Acquire cancelled while waiting for a permit");
                return Err(RenderError::Cancelled);
            }
            AcquireOutcome::TimedOut => {
                let waited_ms = waited_since.elapsed().as_millis() as u64;
                log::warn!("⏳ Timed out waiting for a browser after {}ms", waited_ms);
                return Err(RenderError::PoolTimeout { waited_ms });
            }
            AcquireOutcome::Acquired => {}
        }

        match Self::acquire_after_permit(self_arc) {
            Ok(lease) => Ok(lease),
            Err(e) => {
                // Didn't end up leasing anything; give the permit back.
                self_arc.permits.release();
                Err(e)
            }
        }
    }

    /// Return a browser to the pool (called by [`Lease`]'s `Drop`).
    ///
    /// # Algorithm
    ///
    /// 1. Record the render and the return timestamp
    /// 2. Decrement the active count
    /// 3. If shutting down, or the browser hit `max_renders_per_instance`,
    ///    discard it instead of requeuing
    /// 4. Otherwise enqueue it at the back of the idle queue
    /// 5. Always release the permit
    pub(crate) fn return_browser(self_arc: &Arc<Self>, pooled: PooledBrowser) {
        log::debug!(" Returning browser {} to pool...", pooled.id());

        pooled.record_render();
        pooled.mark_returned();
        self_arc.active_count.fetch_sub(1, Ordering::SeqCst);

        if self_arc.shutting_down.load(Ordering::Acquire) {
            log::debug!(" Pool shutting down, discarding browser {} instead of requeuing", pooled.id());
            self_arc.tracked.lock().unwrap().remove(&pooled.id());
        } else if pooled.should_recycle(self_arc.config.max_renders_per_instance) {
            log::info!(
                "♻️ Browser {} served {} renders, recycling instead of requeuing",
                pooled.id(),
                pooled.render_count()
            );
            self_arc.tracked.lock().unwrap().remove(&pooled.id());
        } else {
            self_arc.idle.lock().unwrap().push_back(pooled);
        }

        self_arc.permits.release();
    }

    /// Invalidate a lease: discard the browser unconditionally instead of
    /// returning it to the idle queue.
    pub(crate) fn invalidate_browser(self_arc: &Arc<Self>, pooled: PooledBrowser) {
        log::debug!(" Discarding invalidated browser {}", pooled.id());

        self_arc.active_count.fetch_sub(1, Ordering::SeqCst);
        self_arc.tracked.lock().unwrap().remove(&pooled.id());
        self_arc.permits.release();
    }

    /// Close idle browsers that have been idle past `idle_timeout`,
    /// never reducing the tracked total below `min_size`.
    ///
    /// Drains the idle queue, sorts newest-first (smallest idle duration
    /// first), then discards from the oldest end while both the idle
    /// duration exceeds `idle_timeout` and the `min_size` floor allows it.
    /// Survivors are re-enqueued.
    pub(crate) fn reap_idle(self_arc: &Arc<Self>) {
        let Some(idle_timeout) = self_arc.config.idle_timeout else {
            return;
        };

        let mut entries: Vec<PooledBrowser> = {
            let mut idle = self_arc.idle.lock().unwrap();
            idle.drain(..).collect()
        };
        entries.sort_by_key(|p| p.idle_duration().unwrap_or(Duration::ZERO));

        let tracked_count = self_arc.tracked.lock().unwrap().len();
        let mut removable = tracked_count.saturating_sub(self_arc.config.min_size);
        let mut reaped = 0usize;

        while removable > 0 {
            let Some(last) = entries.last() else { break };
            let idle_dur = last.idle_duration().unwrap_or(Duration::ZERO);
            if idle_dur < idle_timeout {
                break;
            }

            let pooled = entries.pop().unwrap();
            self_arc.tracked.lock().unwrap().remove(&pooled.id());
            removable -= 1;
            reaped += 1;
            log::info!(
                "⏰ Reaping idle browser {} (idle {}s, timeout {}s)",
                pooled.id(),
                idle_dur.as_secs(),
                idle_timeout.as_secs()
            );
        }

        if reaped > 0 {
            log::info!("Idle reaper closed {} browser(s)", reaped);
        }

        let mut idle = self_arc.idle.lock().unwrap();
        for survivor in entries {
            idle.push_back(survivor);
        }
    }

    /// Get the pool configuration.
    #[inline]
    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check if the pool is shutting down.
    #[inline]
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Set the shutdown flag.
    #[inline]
    pub(crate) fn set_shutting_down(&self, value: bool) {
        self.shutting_down.store(value, Ordering::Release);
    }

    /// Get the shutdown signal for the idle-reaper thread.
    #[inline]
    pub(crate) fn shutdown_signal(&self) -> &Arc<(Mutex<bool>, Condvar)> {
        &self.shutdown_signal
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    pub(crate) fn tracked_count(&self) -> usize {
        self.tracked.lock().map(|g| g.len()).unwrap_or(0)
    }
}

// ============================================================================
// BrowserPool
// ============================================================================

/// Main browser pool with lifecycle management.
///
/// This is the public-facing API for the browser pool. It wraps the
/// internal state and manages the idle-reaper thread.
///
/// # Example
///
/// ```rust,no_run
/// use docrender_core::{BrowserPool, PoolConfigBuilder, ChromeBrowserFactory};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut pool = BrowserPool::builder()
///         .config(
///             PoolConfigBuilder::new()
///                 .max_size(5)
///                 .min_size(2)
///                 .build()?
///         )
///         .factory(Box::new(ChromeBrowserFactory::with_defaults()))
///         .build()?;
///
///     pool.warmup().await?;
///
///     {
///         let browser = pool.get()?;
///         let tab = browser.new_tab()?;
///         // ... do work ...
///     } // browser returned to pool automatically
///
///     pool.shutdown_async().await;
///
///     Ok(())
/// }
/// ```
///
/// # Thread Safety
///
/// `BrowserPool` is `Send` and can be wrapped in `Arc<Mutex<>>` for sharing
/// across threads. Use [`into_shared()`](Self::into_shared) for convenience.
pub struct BrowserPool {
    /// Shared internal state.
    inner: Arc<BrowserPoolInner>,

    /// Handle to the idle-reaping thread.
    ///
    /// `None` means the reaper is disabled (either `idle_timeout` is `None`
    /// or it was disabled at build time).
    reaper_handle: Option<JoinHandle<()>>,
}

impl BrowserPool {
    /// Convert pool into a shared `Arc<Mutex<>>` for use across dispatcher
    /// workers.
    pub fn into_shared(self) -> Arc<Mutex<BrowserPool>> {
        log::debug!(" Converting BrowserPool into shared Arc<Mutex<>>");
        Arc::new(Mutex::new(self))
    }

    /// Create a new builder for constructing a `BrowserPool`.
    pub fn builder() -> BrowserPoolBuilder {
        BrowserPoolBuilder::new()
    }

    /// Acquire a lease, with no cancellation signal attached.
    ///
    /// Equivalent to `get_cancellable(&CancelSignal::none())`. Use this for
    /// file-mode batches and other contexts without an external
    /// cancellation concept.
    ///
    /// # Errors
    ///
    /// - [`RenderError::PoolDisposed`] if the pool is shutting down.
    /// - [`RenderError::PoolTimeout`] if no permit became available within
    ///   `acquire_timeout`.
    /// - Whatever the factory returns if a new browser must be launched.
    pub fn get(&self) -> Result<Lease> {
        self.get_cancellable(&CancelSignal::none())
    }

    /// Acquire a lease, honoring `cancel`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::PoolDisposed`] if the pool is shutting down.
    /// - [`RenderError::Cancelled`] if `cancel` fires before a permit is
    ///   acquired.
    /// - [`RenderError::PoolTimeout`] if no permit became available within
    ///   `acquire_timeout`.
    pub fn get_cancellable(&self, cancel: &CancelSignal) -> Result<Lease> {
        log::trace!(" BrowserPool::get_cancellable() called");
        BrowserPoolInner::acquire(&self.inner, cancel)
    }

    /// Get pool statistics snapshot.
    pub fn stats(&self) -> PoolStats {
        let idle = self.inner.idle_count();
        let active = self.inner.active_count();
        let tracked = self.inner.tracked_count();

        log::trace!(" Pool stats: idle={}, active={}, tracked={}", idle, active, tracked);

        PoolStats { idle, active, tracked }
    }

    /// Pre-create `min_size` browsers so the idle queue isn't empty on the
    /// first request.
    ///
    /// # Errors
    ///
    /// Returns an error if pre-creating any browser fails; browsers
    /// successfully created before the failure remain in the idle queue.
    pub async fn warmup(&self) -> Result<()> {
        let target = self.inner.config().min_size;
        log::info!(" Warming up browser pool with {} instance(s)", target);

        let mut created = 0usize;
        for i in 0..target {
            if self.inner.is_shutting_down() {
                log::info!(" Shutdown detected during warmup, stopping at {}/{}", i, target);
                break;
            }

            let inner = Arc::clone(&self.inner);
            let result = tokio::task::spawn_blocking(move || inner.create_and_track()).await;

            match result {
                Ok(Ok(pooled)) => {
                    let id = pooled.id();
                    self.inner.idle.lock().unwrap().push_back(pooled);
                    created += 1;
                    log::info!("✅ Warmup browser {}/{} ready (id {})", i + 1, target, id);
                }
                Ok(Err(e)) => {
                    log::error!("❌ Warmup browser {}/{} failed: {}", i + 1, target, e);
                    return Err(e);
                }
                Err(e) => {
                    log::error!("❌ Warmup browser {}/{} task panicked: {:?}", i + 1, target, e);
                    return Err(RenderError::BrowserCreation(e.to_string()));
                }
            }
        }

        let stats = self.stats();
        log::info!(
            "✅ Warmup complete ({} created) - idle: {}, active: {}, tracked: {}",
            created,
            stats.idle,
            stats.active,
            stats.tracked
        );
        Ok(())
    }

    /// Start the idle-reaping thread.
    ///
    /// # Critical Design Notes
    ///
    /// - Uses a condvar for immediate shutdown signaling
    /// - Never holds locks during I/O operations
    fn start_reaper(inner: Arc<BrowserPoolInner>, interval: Duration) -> JoinHandle<()> {
        let shutdown_signal = Arc::clone(inner.shutdown_signal());

        log::info!(" Starting idle-reaper thread (interval: {}s)", interval.as_secs());

        thread::spawn(move || {
            log::info!(" Idle-reaper thread started successfully");

            loop {
                let (lock, cvar) = &*shutdown_signal;
                let wait_result = {
                    let shutdown = lock.lock().unwrap();
                    cvar.wait_timeout(shutdown, interval).unwrap()
                };

                let shutdown_flag = *wait_result.0;
                let timed_out = wait_result.1.timed_out();

                if shutdown_flag || inner.is_shutting_down() {
                    log::info!(" Idle-reaper received shutdown signal");
                    break;
                }

                if !timed_out {
                    log::trace!("⏰ Idle-reaper spuriously woken, continuing wait...");
                    continue;
                }

                log::trace!(" Idle-reaper cycle starting...");
                BrowserPoolInner::reap_idle(&inner);
            }

            log::info!(" Idle-reaper thread exiting cleanly");
        })
    }

    /// Asynchronously shut down the pool (recommended method).
    ///
    /// 1. Set the atomic shutdown flag (stops new leases)
    /// 2. Signal the condvar to wake the idle-reaper thread immediately
    /// 3. Wait for the idle-reaper thread to exit (with timeout)
    /// 4. Log final statistics
    pub async fn shutdown_async(&mut self) {
        log::info!("Shutting down browser pool (async mode)...");

        self.inner.set_shutting_down(true);
        log::debug!("Shutdown flag set");

        {
            let (lock, cvar) = &**self.inner.shutdown_signal();
            let mut shutdown = lock.lock().unwrap();
            *shutdown = true;
            cvar.notify_all();
            log::debug!("Shutdown signal sent to idle-reaper thread");
        }

        if let Some(handle) = self.reaper_handle.take() {
            log::debug!("Waiting for idle-reaper thread to exit...");
            let join_task = tokio::task::spawn_blocking(move || handle.join());

            match tokio::time::timeout(Duration::from_secs(5), join_task).await {
                Ok(Ok(Ok(_))) => log::info!("Idle-reaper thread stopped cleanly"),
                Ok(Ok(Err(_))) => log::error!("Idle-reaper thread panicked during shutdown"),
                Ok(Err(_)) => log::error!("Idle-reaper join task panicked"),
                Err(_) => log::error!("Idle-reaper thread didn't exit within 5s timeout"),
            }
        } else {
            log::debug!("No idle-reaper thread to stop (was disabled)");
        }

        let stats = self.stats();
        log::info!(
            "Async shutdown complete - idle: {}, active: {}, tracked: {}",
            stats.idle,
            stats.active,
            stats.tracked
        );
    }

    /// Synchronously shut down the pool (fallback method for `Drop` or
    /// other non-async contexts).
    pub fn shutdown(&mut self) {
        log::debug!("Calling synchronous shutdown...");
        self.shutdown_sync();
    }

    fn shutdown_sync(&mut self) {
        log::info!("Shutting down browser pool (sync mode)...");

        self.inner.set_shutting_down(true);

        {
            let (lock, cvar) = &**self.inner.shutdown_signal();
            let mut shutdown = lock.lock().unwrap();
            *shutdown = true;
            cvar.notify_all();
        }

        if let Some(handle) = self.reaper_handle.take() {
            match handle.join() {
                Ok(_) => log::info!("Idle-reaper thread stopped"),
                Err(_) => log::error!("Idle-reaper thread panicked"),
            }
        }

        let stats = self.stats();
        log::info!("Sync shutdown complete - idle: {}, active: {}", stats.idle, stats.active);
    }

    /// Get a reference to the inner pool state.
    ///
    /// Primarily for internal use and testing.
    #[doc(hidden)]
    #[allow(dead_code)]
    pub(crate) fn inner(&self) -> &Arc<BrowserPoolInner> {
        &self.inner
    }
}

impl Drop for BrowserPool {
    /// Automatic cleanup when the pool is dropped.
    ///
    /// Uses sync shutdown since `Drop` can't be async.
    fn drop(&mut self) {
        log::debug!(" BrowserPool Drop triggered - running cleanup");

        if !self.inner.is_shutting_down() {
            log::warn!(" BrowserPool dropped without explicit shutdown - cleaning up");
            self.shutdown();
        } else {
            log::debug!(" Pool already shutdown, Drop is no-op");
        }
    }
}

// ============================================================================
// BrowserPoolBuilder
// ============================================================================

/// Builder for constructing a [`BrowserPool`] with validation.
///
/// # Example
///
/// ```rust,ignore
/// use docrender_core::{BrowserPool, PoolConfigBuilder, ChromeBrowserFactory};
///
/// let pool = BrowserPool::builder()
///     .config(
///         PoolConfigBuilder::new()
///             .max_size(10)
///             .min_size(3)
///             .build()?
///     )
///     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
///     .enable_reaper(true)
///     .build()?;
/// ```
pub struct BrowserPoolBuilder {
    /// Optional configuration (uses default if not provided).
    config: Option<PoolConfig>,

    /// Browser factory (required).
    factory: Option<Box<dyn BrowserFactory>>,

    /// Whether to enable the idle-reaper thread (default: true).
    enable_reaper: bool,
}

impl BrowserPoolBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: None,
            factory: None,
            enable_reaper: true,
        }
    }

    /// Set custom configuration. If not called, uses [`PoolConfig::default()`].
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set browser factory (required).
    pub fn factory(mut self, factory: Box<dyn BrowserFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Enable or disable the idle-reaper thread.
    ///
    /// Disabling should only be done for testing; production use should
    /// always leave it enabled.
    pub fn enable_reaper(mut self, enable: bool) -> Self {
        self.enable_reaper = enable;
        self
    }

    /// Build the browser pool.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] if no factory was provided.
    pub fn build(self) -> Result<BrowserPool> {
        let config = self.config.unwrap_or_default();
        let factory = self
            .factory
            .ok_or_else(|| RenderError::Configuration("No browser factory provided".to_string()))?;

        log::info!("️ Building browser pool with config: max_size={}, min_size={}", config.max_size, config.min_size);

        let reaper_interval = if self.enable_reaper { config.reaper_interval() } else { None };
        let inner = BrowserPoolInner::new(config, factory);

        let reaper_handle = reaper_interval.map(|interval| {
            log::info!(" Starting idle-reaper thread");
            BrowserPool::start_reaper(Arc::clone(&inner), interval)
        });

        if reaper_handle.is_none() {
            log::warn!("⚠️ Idle-reaper thread disabled (idle_timeout is None or reaper disabled)");
        }

        log::info!("✅ Browser pool built successfully");

        Ok(BrowserPool { inner, reaper_handle })
    }
}

impl Default for BrowserPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Initialization (feature-gated)
// ============================================================================

/// Initialize a browser pool from environment variables, warm it up, and
/// return it ready for use.
///
/// # Feature Flag
///
/// Only available when the `env-config` feature is enabled.
#[cfg(feature = "env-config")]
pub async fn init_browser_pool() -> Result<Arc<Mutex<BrowserPool>>> {
    use crate::config::env::{chrome_path_from_env, pool_config_from_env};
    use crate::factory::ChromeBrowserFactory;

    log::info!("Initializing browser pool from environment...");

    let config = pool_config_from_env()?;
    let chrome_path = chrome_path_from_env();

    log::info!("Pool configuration from environment:");
    log::info!("   - Min size: {}", config.min_size);
    log::info!("   - Max size: {}", config.max_size);
    log::info!("   - Acquire timeout: {}s", config.acquire_timeout.as_secs());
    log::info!(
        "   - Chrome path: {}",
        chrome_path.as_deref().unwrap_or("auto-detect")
    );

    let factory: Box<dyn BrowserFactory> = match chrome_path {
        Some(path) => {
            log::info!("Using custom Chrome path: {}", path);
            Box::new(ChromeBrowserFactory::with_path(path))
        }
        None => {
            log::info!("Using auto-detected Chrome browser");
            Box::new(ChromeBrowserFactory::with_defaults())
        }
    };

    let pool = BrowserPool::builder()
        .config(config)
        .factory(factory)
        .enable_reaper(true)
        .build()
        .map_err(|e| {
            log::error!("❌ Failed to create browser pool: {}", e);
            e
        })?;

    log::info!("✅ Browser pool created successfully");

    pool.warmup().await.map_err(|e| {
        log::error!("❌ Failed to warmup pool: {}", e);
        e
    })?;

    let stats = pool.stats();
    log::info!(
        "✅ Browser pool ready - idle: {}, active: {}, tracked: {}",
        stats.idle,
        stats.active,
        stats.tracked
    );

    Ok(pool.into_shared())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that BrowserPool builder rejects missing factory.
    #[test]
    fn test_pool_builder_missing_factory() {
        let config = PoolConfig::default();

        let result = BrowserPool::builder().config(config).build();

        assert!(result.is_err(), "Build should fail without factory");

        match result {
            Err(RenderError::Configuration(msg)) => {
                assert!(
                    msg.contains("No browser factory provided"),
                    "Expected factory error, got: {}",
                    msg
                );
            }
            _ => panic!("Expected Configuration error for missing factory"),
        }
    }

    /// Verifies that BrowserPoolBuilder implements Default.
    #[test]
    fn test_builder_default() {
        let builder: BrowserPoolBuilder = Default::default();
        assert!(builder.config.is_none());
        assert!(builder.factory.is_none());
        assert!(builder.enable_reaper);
    }

    /// Verifies that enable_reaper can be disabled.
    #[test]
    fn test_builder_disable_reaper() {
        let builder = BrowserPoolBuilder::new().enable_reaper(false);
        assert!(!builder.enable_reaper);
    }

    /// The semaphore must not consume a permit on a timed-out acquire.
    #[test]
    fn test_semaphore_timeout_does_not_consume_permit() {
        let sem = Semaphore::new(0);
        let cancel = CancelSignal::new();

        match sem.acquire_timeout(Duration::from_millis(50), &cancel) {
            AcquireOutcome::TimedOut => {}
            _ => panic!("expected timeout with zero permits"),
        }

        sem.release();
        match sem.acquire_timeout(Duration::from_millis(50), &cancel) {
            AcquireOutcome::Acquired => {}
            _ => panic!("expected to acquire the released permit"),
        }
    }

    /// A pre-cancelled signal should short-circuit the wait.
    #[test]
    fn test_semaphore_observes_cancellation() {
        let sem = Semaphore::new(0);
        let cancel = CancelSignal::new();
        cancel.cancel();

        match sem.acquire_timeout(Duration::from_secs(5), &cancel) {
            AcquireOutcome::Cancelled => {}
            _ => panic!("expected cancellation to short-circuit the wait"),
        }
    }

    /// Acquiring with available permits succeeds immediately.
    #[test]
    fn test_semaphore_acquire_release_roundtrip() {
        let sem = Semaphore::new(1);
        let cancel = CancelSignal::new();

        match sem.acquire_timeout(Duration::from_millis(10), &cancel) {
            AcquireOutcome::Acquired => {}
            _ => panic!("expected immediate acquire"),
        }

        match sem.acquire_timeout(Duration::from_millis(10), &cancel) {
            AcquireOutcome::TimedOut => {}
            _ => panic!("expected timeout with no permits left"),
        }

        sem.release();
        match sem.acquire_timeout(Duration::from_millis(10), &cancel) {
            AcquireOutcome::Acquired => {}
            _ => panic!("expected acquire after release"),
        }
    }
}
