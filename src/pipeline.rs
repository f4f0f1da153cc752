//! Rendering pipeline (C5) — sequences the templating engine and the PDF
//! renderer into a single `execute` call.
//!
//! Grounded on the "phase as an instrumented step" shape of
//! `DocumentPipeline::process` in the wider example pack, but *not* on that
//! example's catch-and-convert-to-failed-status behavior: per SPEC_FULL.md
//! §4.4, a failure at any step propagates unchanged rather than being
//! folded into a partial result.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::cancel::CancelSignal;
use crate::engine::TemplateEngine;
use crate::error::Result;
use crate::model::{RenderRequest, RenderResult};
use crate::pool::BrowserPool;
use crate::renderer;

/// Sequences engine → renderer for a single [`RenderRequest`].
///
/// Holds a shared reference to the browser pool; stateless otherwise.
pub struct Pipeline {
    pool: Arc<Mutex<BrowserPool>>,
}

impl Pipeline {
    /// Build a pipeline against a shared pool.
    pub fn new(pool: Arc<Mutex<BrowserPool>>) -> Self {
        Self { pool }
    }

    /// Render `request` end to end: template expansion, then PDF
    /// generation. Measures wall-clock elapsed time from entry to the
    /// finished [`RenderResult`].
    ///
    /// # Errors
    ///
    /// Any error from the engine or renderer propagates unchanged; no
    /// partial result is ever returned.
    pub fn execute(&self, request: &RenderRequest, cancel: &CancelSignal) -> Result<RenderResult> {
        let start = Instant::now();

        log::debug!(
            " Pipeline starting job {} (documentType={})",
            request.job_id,
            request.template.document_type
        );

        let html = TemplateEngine::render(&request.template, cancel)?;
        log::trace!(" Job {} template rendered ({} bytes HTML)", request.job_id, html.len());

        let lease = {
            let pool = self.pool.lock().unwrap_or_else(|e| e.into_inner());
            pool.get_cancellable(cancel)?
        };

        let pdf_bytes = match renderer::render_pdf(&lease, &html, &request.template.pdf, cancel) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("⚠️ Job {} render failed, invalidating lease: {e}", request.job_id);
                lease.invalidate();
                return Err(e);
            }
        };

        let elapsed = start.elapsed();
        log::info!(
            "✅ Job {} rendered in {:?} ({} bytes PDF)",
            request.job_id,
            elapsed,
            pdf_bytes.len()
        );

        Ok(RenderResult::new(
            request.job_id.clone(),
            request.template.document_type.clone(),
            pdf_bytes,
            elapsed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfigBuilder;
    use crate::factory::mock::MockBrowserFactory;
    use crate::model::{Branding, DocumentTemplate, PdfOptions, TemplateContent, VariantMap};

    fn test_pool() -> Arc<Mutex<BrowserPool>> {
        let config = PoolConfigBuilder::new().min_size(0).max_size(1).build().unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(MockBrowserFactory::new()))
            .enable_reaper(false)
            .build()
            .unwrap();
        Arc::new(Mutex::new(pool))
    }

    fn test_request() -> RenderRequest {
        RenderRequest::new(
            Some("job-1".to_string()),
            DocumentTemplate {
                document_type: "invoice".into(),
                version: "1".into(),
                branding: Branding::default(),
                template: TemplateContent {
                    html: "<p>{{variables.name}}</p>".into(),
                    ..Default::default()
                },
                variables: {
                    let mut v = VariantMap::new();
                    v.insert("name", crate::model::Variant::String("Alice".into()));
                    v
                },
                pdf: PdfOptions::default(),
            },
        )
    }

    #[test]
    fn test_execute_propagates_cancellation_before_render() {
        let pipeline = Pipeline::new(test_pool());
        let cancel = CancelSignal::new();
        cancel.cancel();
        let result = pipeline.execute(&test_request(), &cancel);
        assert!(matches!(result, Err(crate::error::RenderError::Cancelled)));
    }
}
