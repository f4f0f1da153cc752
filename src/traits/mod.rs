//! Traits for abstraction and extensibility.
//!
//! This module provides traits that define the core abstractions used by
//! the browser pool. These traits enable:
//!
//! - **Health monitoring**: [`Healthcheck`] for verifying browser health
//! - **Extensibility**: Custom implementations for different use cases
//!
//! # Implementing Custom Health Checks
//!
//! While `PooledBrowser` implements [`Healthcheck`]
//! by default, you can implement custom health check logic:
//!
//! ```rust,ignore
//! use docrender_core::{Healthcheck, Result, RenderError};
//!
//! struct MyCustomBrowser {
//!     // your fields
//! }
//!
//! impl Healthcheck for MyCustomBrowser {
//!     fn ping(&self) -> Result<()> {
//!         // Your custom health check logic
//!         Ok(())
//!     }
//! }
//! ```

mod healthcheck;

pub use healthcheck::Healthcheck;