//! Convenient imports for common usage patterns.
//!
//! This module re-exports the most commonly used types from `docrender-core`,
//! allowing you to quickly get started with a single import.
//!
//! ```rust,ignore
//! use docrender_core::prelude::*;
//! ```

// Core pool types
pub use crate::config::{PoolConfig, PoolConfigBuilder, QueueConfig, QueueConfigBuilder};
pub use crate::error::{RenderError, Result};
pub use crate::lease::Lease;
pub use crate::pool::{BrowserPool, BrowserPoolBuilder};
pub use crate::stats::PoolStats;
pub use crate::traits::Healthcheck;

// Cancellation
pub use crate::cancel::CancelSignal;

// Rendering
pub use crate::engine::TemplateEngine;
pub use crate::pipeline::Pipeline;
pub use crate::renderer;

// Dispatchers
pub use crate::dispatcher;
pub use crate::dispatcher::{DispatchOutcome, QueueDispatcher, QueueTransport};

// Data model
pub use crate::model::{
    Branding, CorrelatedRequest, CorrelatedResponse, DocumentTemplate, Margins, PaperFormat, PdfOptions,
    RenderRequest, RenderResult, TemplateContent, Variant, VariantMap,
};

// Factory (mainly useful for tests via `test-utils`)
pub use crate::factory::{BrowserFactory, ChromeBrowserFactory, create_chrome_options};

#[cfg(feature = "test-utils")]
pub use crate::factory::mock::MockBrowserFactory;

// Environment-based configuration
#[cfg(feature = "env-config")]
pub use crate::config::env::{chrome_path_from_env, pool_config_from_env, queue_config_from_env};

#[cfg(feature = "env-config")]
pub use crate::pool::init_browser_pool;

pub use crate::SharedBrowserPool;

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that the prelude actually brings in everything a caller
    /// needs to build a pool and a pipeline without further `use` lines.
    #[test]
    fn test_prelude_exposes_pool_and_pipeline_types() {
        let config: PoolConfig = PoolConfigBuilder::new().min_size(0).max_size(1).build().unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(crate::factory::mock::MockBrowserFactory::new()))
            .enable_reaper(false)
            .build()
            .unwrap();
        let shared: SharedBrowserPool = std::sync::Arc::new(std::sync::Mutex::new(pool));
        let _pipeline = Pipeline::new(shared);
        let _cancel = CancelSignal::new();
    }
}
