//! Health check trait for browser instances.
//!
//! This module provides the [`Healthcheck`] trait, which defines how a
//! pooled browser verifies it is still functional before a lease is handed
//! out.
//!
//! # Overview
//!
//! Rather than a periodic keep-alive thread pinging every tracked browser,
//! the pool runs this check synchronously as part of acquire (see
//! SPEC_FULL.md §4.2 acquire step 3): if it fails, the pool discards that
//! instance and tries the next idle browser or creates a fresh one.
//!
//! # Default Implementation
//!
//! [`PooledBrowser`](crate::PooledBrowser) implements this trait by
//! creating and immediately closing a tab.

use crate::error::Result;

/// Trait for browser-like objects that support an on-acquire connectivity
/// check.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because a browser may be checked from
/// whichever task happens to be acquiring a lease.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use docrender_core::{Healthcheck, Result, RenderError};
///
/// struct MyBrowser {
///     inner: SomeBrowserType,
/// }
///
/// impl Healthcheck for MyBrowser {
///     fn ping(&self) -> Result<()> {
///         let tab = self.inner.new_tab()
///             .map_err(|e| RenderError::BrowserCreation(e.to_string()))?;
///         let _ = tab.close();
///         Ok(())
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Verify the browser is still responsive.
    ///
    /// Should perform a lightweight operation like creating/closing a tab.
    ///
    /// # Implementation Guidelines
    ///
    /// - **Keep it fast**: this runs on every acquire, not periodically
    /// - **Don't hold locks**: release any locks before performing I/O
    /// - **Be idempotent**: multiple calls should be safe
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BrowserCreation`](crate::RenderError::BrowserCreation)
    /// if the check fails (browser unresponsive or crashed).
    fn ping(&self) -> Result<()>;
}
