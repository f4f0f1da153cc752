//! Error types for the render orchestration engine.
//!
//! This module provides [`RenderError`], a unified error type spanning the
//! templating engine, browser pool, PDF renderer, pipeline, and dispatchers,
//! and a convenient [`Result`] type alias.
//!
//! # Example
//!
//! ```rust
//! use docrender_core::{RenderError, Result};
//!
//! fn render_document() -> Result<Vec<u8>> {
//!     // Your logic here...
//!     Err(RenderError::PoolDisposed)
//! }
//!
//! match render_document() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(RenderError::PoolDisposed) => println!("Pool is shutting down"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

/// Errors that can occur anywhere in the render orchestration engine.
///
/// Each variant corresponds to one of the error kinds named in the
/// dispatcher/pool/renderer/engine contract. Kinds are not recoverable by
/// the component that raises them — the dispatcher is the single recovery
/// point (retry + dead-letter in queue mode, log + count in file mode).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Handlebars template/CSS failed to compile.
    ///
    /// Queue mode: retried, then dead-lettered on exhaustion.
    #[error("template parse error: {0}")]
    TemplateParse(String),

    /// Handlebars template evaluation (render) failed.
    ///
    /// Queue mode: retried, then dead-lettered on exhaustion.
    #[error("template evaluation error: {0}")]
    TemplateEval(String),

    /// No pool capacity became available within `acquireTimeout`.
    ///
    /// Queue mode: retried.
    #[error("timed out waiting for a browser after {waited_ms}ms")]
    PoolTimeout {
        /// How long the caller waited before timing out.
        waited_ms: u64,
    },

    /// A lease was requested after the pool began shutting down.
    ///
    /// Fatal for the request that observed it; never retried.
    #[error("browser pool is shutting down")]
    PoolDisposed,

    /// Page load or network-idle wait failed or timed out.
    ///
    /// The lease that observed this is invalidated before the error
    /// surfaces. Queue mode: retried.
    #[error("page load failed: {0}")]
    RenderLoad(String),

    /// The PDF-bytes step of rendering failed.
    ///
    /// The lease that observed this is invalidated before the error
    /// surfaces. Queue mode: retried.
    #[error("pdf generation failed: {0}")]
    RenderPdf(String),

    /// The caller's cancel signal fired before or during the operation.
    ///
    /// Surfaced unchanged; never retried.
    #[error("operation cancelled")]
    Cancelled,

    /// A file-mode template file could not be read or parsed as JSON.
    ///
    /// Logged and counted as a per-file failure; does not halt the scan.
    #[error("failed to read or parse template file {path}: {source}")]
    IoTemplate {
        /// Path of the offending template file.
        path: String,
        /// Underlying I/O or JSON error message.
        source: String,
    },

    /// Writing the rendered PDF (or creating its parent directory) failed.
    ///
    /// Queue mode: retried.
    #[error("failed to write output {path}: {source}")]
    IoOutput {
        /// Path the PDF was being written to.
        path: String,
        /// Underlying I/O error message.
        source: String,
    },

    /// A configuration value failed validation at builder time.
    ///
    /// Not one of the nine request-time kinds in the spec's error
    /// taxonomy, but required to keep the builder-with-validation pattern
    /// this crate's configuration types rely on.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failed to launch or validate a new browser process.
    #[error("failed to create browser: {0}")]
    BrowserCreation(String),
}

impl RenderError {
    /// Whether this error kind is one the queue-mode dispatcher should ask
    /// the transport to retry (see SPEC_FULL.md §7's propagation table).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RenderError::TemplateParse(_)
                | RenderError::TemplateEval(_)
                | RenderError::PoolTimeout { .. }
                | RenderError::RenderLoad(_)
                | RenderError::RenderPdf(_)
                | RenderError::IoOutput { .. }
        )
    }
}

/// Result type alias using [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RenderError::PoolTimeout { waited_ms: 50 };
        assert_eq!(
            error.to_string(),
            "timed out waiting for a browser after 50ms"
        );

        let error = RenderError::PoolDisposed;
        assert_eq!(error.to_string(), "browser pool is shutting down");

        let error = RenderError::Cancelled;
        assert_eq!(error.to_string(), "operation cancelled");
    }

    #[test]
    fn test_is_retryable() {
        assert!(RenderError::PoolTimeout { waited_ms: 1 }.is_retryable());
        assert!(RenderError::RenderLoad("x".into()).is_retryable());
        assert!(RenderError::RenderPdf("x".into()).is_retryable());
        assert!(RenderError::TemplateParse("x".into()).is_retryable());
        assert!(RenderError::TemplateEval("x".into()).is_retryable());
        assert!(
            RenderError::IoOutput {
                path: "x".into(),
                source: "x".into()
            }
            .is_retryable()
        );

        assert!(!RenderError::Cancelled.is_retryable());
        assert!(!RenderError::PoolDisposed.is_retryable());
        assert!(
            !RenderError::IoTemplate {
                path: "x".into(),
                source: "x".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<RenderError>();
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderError>();
    }
}
