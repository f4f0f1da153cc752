//! # docrender-core
//!
//! Render orchestration engine for a document render service: Handlebars-style
//! templating, a self-healing headless-browser pool, and queue/file-mode
//! dispatchers that turn templates into PDFs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   Queue dispatcher   │   File dispatcher    │
//! │   (C6, broker-fed)   │   (C7, dir-fed)      │
//! └──────────────┬────────────────┬─────────────┘
//!                │                │
//!                ▼                ▼
//! ┌─────────────────────────────────────────────┐
//! │                  Pipeline                    │
//! │     TemplateEngine::render → renderer::render_pdf
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │              BrowserPool                    │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Available Pool (idle browsers)        │ │
//! │ │   [Browser1] [Browser2] [Browser3]      │ │
//! │ └─────────────────────────────────────────┘ │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Active Tracking (in-use browsers)     │ │
//! │ │   {id → Browser}                        │ │
//! │ └─────────────────────────────────────────┘ │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Idle Reaper Thread                    │ │
//! │ │   (closes browsers past idleTimeout)    │ │
//! │ └─────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │        Headless Chrome Browsers             │
//! │     (managed by headless_chrome crate)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start — file-mode dispatcher
//!
//! ```rust,ignore
//! use docrender_core::prelude::*;
//! use std::sync::Arc;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_browser_pool().await?;
//!     let pipeline = Arc::new(Pipeline::new(pool));
//!
//!     let summary = dispatcher::file::run(
//!         pipeline,
//!         Path::new("./templates"),
//!         Path::new("./output"),
//!         CancelSignal::new(),
//!     )
//!     .await;
//!
//!     println!("{} succeeded, {} failed", summary.success_count(), summary.failure_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Quick Start — queue-mode dispatcher
//!
//! ```rust,ignore
//! use docrender_core::prelude::*;
//! use std::sync::Arc;
//!
//! async fn run_queue(pool: SharedBrowserPool, transport: Arc<dyn QueueTransport>) {
//!     let pipeline = Arc::new(Pipeline::new(pool));
//!     let dispatcher = QueueDispatcher::new(pipeline, transport, QueueConfig::default());
//!     dispatcher.run(CancelSignal::new()).await;
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! When the `env-config` feature is enabled, you can initialize the pool
//! from environment variables (loaded from `app.env` file or system environment):
//!
//! ```rust,no_run
//! use docrender_core::init_browser_pool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_browser_pool().await?;
//!     // pool is Arc<Mutex<BrowserPool>>, ready to hand to a Pipeline
//!     Ok(())
//! }
//! ```
//!
//! ### Environment File
//!
//! Create an `app.env` file in your project root (not `.env` for better
//! cross-platform visibility):
//!
//! ```text
//! POOL_MIN_SIZE=1
//! POOL_MAX_SIZE=4
//! POOL_IDLE_TIMEOUT_SECONDS=300
//! ```
//!
//! See [`config::env`] for the full list of `POOL_*`/`QUEUE_*` variables and
//! their defaults.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Enable environment-based configuration |
//! | `test-utils` | Enable mock factory for testing |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, RenderError>`](Result).
//! The error type provides context about what went wrong:
//!
//! ```rust,ignore
//! use docrender_core::{Pipeline, RenderError};
//!
//! match pipeline.execute(&request, &cancel) {
//!     Ok(result) => {
//!         // Use result.pdf_bytes
//!     }
//!     Err(RenderError::Cancelled) => {
//!         // Caller asked us to stop
//!     }
//!     Err(RenderError::PoolTimeout { .. }) => {
//!         // No browser became available in time
//!     }
//!     Err(e) => {
//!         eprintln!("Render error: {}", e);
//!     }
//! }
//! ```
//!
//! ## Testing
//!
//! For testing without Chrome, enable the `test-utils` feature and use
//! [`MockBrowserFactory`](factory::mock::MockBrowserFactory):
//!
//! ```rust,ignore
//! use docrender_core::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::always_fails("Test error");
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(factory))
//!     .enable_reaper(false)
//!     .build()?;
//! ```

#![doc(html_root_url = "https://docs.rs/docrender-core/0.3.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod cancel;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod factory;
pub mod lease;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod prelude;
pub mod renderer;
pub mod stats;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod tracked;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

// Core types
pub use cancel::CancelSignal;
pub use config::{PoolConfig, PoolConfigBuilder, QueueConfig, QueueConfigBuilder};
pub use dispatcher::{DispatchOutcome, QueueDispatcher, QueueTransport};
pub use engine::TemplateEngine;
pub use error::{RenderError, Result};
pub use factory::{BrowserFactory, ChromeBrowserFactory, create_chrome_options};
pub use lease::Lease;
pub use pipeline::Pipeline;
pub use pool::{BrowserPool, BrowserPoolBuilder};
pub use stats::PoolStats;
pub use traits::Healthcheck;

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, pool_config_from_env, queue_config_from_env};

#[cfg(feature = "env-config")]
pub use pool::init_browser_pool;

// ============================================================================
// Convenience type aliases
// ============================================================================

/// Shared browser pool type for dispatchers.
///
/// This is the recommended type for sharing a pool between [`Pipeline`]
/// instances and background tasks.
///
/// # Example
///
/// ```rust,ignore
/// use docrender_core::SharedBrowserPool;
///
/// let pool: SharedBrowserPool = browser_pool.into_shared();
/// ```
pub type SharedBrowserPool = std::sync::Arc<std::sync::Mutex<BrowserPool>>;
