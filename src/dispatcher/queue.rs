//! Queue-mode dispatcher (C6) — drains a message broker and renders each
//! correlated request through the shared [`Pipeline`].
//!
//! Grounded on the teacher's "thin handler, thick service" split
//! (`service/mod.rs`) for the overall dispatcher shape, and `service/pdf.rs`'s
//! pool-lock-then-release-before-work pattern for why this module never
//! touches the pool directly — it only ever goes through [`Pipeline::execute`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::sync::Semaphore;

use crate::cancel::CancelSignal;
use crate::config::QueueConfig;
use crate::error::{RenderError, Result};
use crate::model::{CorrelatedRequest, CorrelatedResponse, RenderRequest};
use crate::pipeline::Pipeline;

use super::DispatchOutcome;

/// Narrow boundary between the dispatcher and a concrete message broker.
///
/// No broker client ships in this crate (SPEC_FULL.md §1's non-goals); the
/// dispatcher depends only on this trait, implemented by whatever transport
/// the embedding application wires up (Kafka, Azure Service Bus, an
/// in-memory test double, ...).
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Poll for the next inbound request, waiting up to the transport's own
    /// poll timeout. Returns `None` on a timeout with no message available
    /// (not an error — the dispatcher loops and tries again).
    async fn next_request(&self) -> Result<Option<CorrelatedRequest>>;

    /// Publish a reply to the envelope's return route.
    async fn publish_reply(&self, reply: CorrelatedResponse) -> Result<()>;

    /// Report whether the request succeeded or should be retried. The
    /// transport owns retry counting, exponential backoff, and dead-letter
    /// routing per SPEC_FULL.md §4.5 — this call is purely informational
    /// from the dispatcher's point of view.
    async fn report_outcome(&self, request: &CorrelatedRequest, outcome: DispatchOutcome);
}

/// Drains a [`QueueTransport`], bounding in-flight renders to
/// `maxConcurrentRenders` and forwarding each request through the shared
/// [`Pipeline`].
pub struct QueueDispatcher {
    pipeline: Arc<Pipeline>,
    transport: Arc<dyn QueueTransport>,
    config: QueueConfig,
    semaphore: Arc<Semaphore>,
    success_count: Arc<AtomicU64>,
    failure_count: Arc<AtomicU64>,
}

impl QueueDispatcher {
    /// Build a dispatcher. `config.max_concurrent_renders` bounds the
    /// dispatcher's own in-flight work; see SPEC_FULL.md §4.5's invariant
    /// that this should not exceed the pool's `max_size`.
    pub fn new(pipeline: Arc<Pipeline>, transport: Arc<dyn QueueTransport>, config: QueueConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_renders));
        Self {
            pipeline,
            transport,
            config,
            semaphore,
            success_count: Arc::new(AtomicU64::new(0)),
            failure_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Successful renders handled since construction.
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Failed renders handled since construction.
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Run the drain loop until `cancel` fires. Each request is handled on
    /// its own spawned task once a concurrency permit is available, so a
    /// slow render never blocks polling for the next message.
    pub async fn run(&self, cancel: CancelSignal) {
        log::info!(
            " Queue dispatcher starting (maxConcurrentRenders={})",
            self.config.max_concurrent_renders
        );

        while !cancel.is_cancelled() {
            let request = match self.transport.next_request().await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    tokio::time::sleep(self.config.poll_timeout).await;
                    continue;
                }
                Err(e) => {
                    log::error!("❌ Transport poll failed: {e}");
                    tokio::time::sleep(self.config.poll_timeout).await;
                    continue;
                }
            };

            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let pipeline = Arc::clone(&self.pipeline);
            let transport = Arc::clone(&self.transport);
            let output_root = self.config.pdf_output_path.clone();
            let cancel = cancel.clone();
            let success_count = Arc::clone(&self.success_count);
            let failure_count = Arc::clone(&self.failure_count);

            tokio::spawn(async move {
                let _permit = permit;
                handle_request(
                    pipeline,
                    transport.as_ref(),
                    &output_root,
                    request,
                    &cancel,
                    &success_count,
                    &failure_count,
                )
                .await;
            });
        }

        log::info!(" Queue dispatcher stopped");
    }
}

/// Classify a pipeline failure into the outcome the transport should act on.
/// Terminal errors (cancellation, a disposed pool) are never retried per
/// SPEC_FULL.md §7; everything else retryable per
/// [`RenderError::is_retryable`] goes back on the queue.
fn outcome_for_error(error: &RenderError) -> DispatchOutcome {
    if error.is_retryable() {
        DispatchOutcome::Retry
    } else {
        DispatchOutcome::Failed
    }
}

async fn handle_request(
    pipeline: Arc<Pipeline>,
    transport: &dyn QueueTransport,
    output_root: &str,
    request: CorrelatedRequest,
    cancel: &CancelSignal,
    success_count: &AtomicU64,
    failure_count: &AtomicU64,
) {
    let render_request = RenderRequest::new(Some(request.correlation_id.clone()), request.template.clone());

    let result = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || pipeline.execute(&render_request, &cancel)
    })
    .await;

    let reply = match result {
        Ok(Ok(render_result)) => {
            match build_success_reply(&request, output_root, render_result).await {
                Ok(reply) => {
                    success_count.fetch_add(1, Ordering::Relaxed);
                    transport.report_outcome(&request, DispatchOutcome::Success).await;
                    reply
                }
                Err(e) => {
                    log::error!("❌ Job {} failed writing output: {e}", request.correlation_id);
                    failure_count.fetch_add(1, Ordering::Relaxed);
                    transport.report_outcome(&request, outcome_for_error(&e)).await;
                    CorrelatedResponse::failure(&request, e.to_string(), std::time::Duration::default())
                }
            }
        }
        Ok(Err(e)) => {
            log::error!("❌ Job {} failed: {e}", request.correlation_id);
            failure_count.fetch_add(1, Ordering::Relaxed);
            transport.report_outcome(&request, outcome_for_error(&e)).await;
            CorrelatedResponse::failure(&request, e.to_string(), std::time::Duration::default())
        }
        Err(join_error) => {
            log::error!("❌ Job {} panicked: {join_error}", request.correlation_id);
            failure_count.fetch_add(1, Ordering::Relaxed);
            transport.report_outcome(&request, DispatchOutcome::Retry).await;
            CorrelatedResponse::failure(&request, join_error.to_string(), std::time::Duration::default())
        }
    };

    if let Err(e) = transport.publish_reply(reply).await {
        log::error!("❌ Failed to publish reply for job {}: {e}", request.correlation_id);
    }
}

async fn build_success_reply(
    request: &CorrelatedRequest,
    output_root: &str,
    render_result: crate::model::RenderResult,
) -> Result<CorrelatedResponse> {
    if request.return_pdf_inline {
        let pdf_base64 = STANDARD.encode(&render_result.pdf_bytes);
        return Ok(CorrelatedResponse::success_inline(
            request,
            render_result.document_type,
            pdf_base64,
            render_result.elapsed,
        ));
    }

    let path = output_path(output_root, &render_result.document_type, &request.correlation_id);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| RenderError::IoOutput {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
    }

    tokio::fs::write(&path, &render_result.pdf_bytes)
        .await
        .map_err(|e| RenderError::IoOutput {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;

    Ok(CorrelatedResponse::success_path(
        request,
        render_result.document_type,
        path.display().to_string(),
        render_result.elapsed,
    ))
}

/// `<outputRoot>/<documentType>_<id-without-dashes>.pdf`, per SPEC_FULL.md §6.
fn output_path(output_root: &str, document_type: &str, correlation_id: &str) -> PathBuf {
    let id_no_dashes: String = correlation_id.chars().filter(|c| *c != '-').collect();
    PathBuf::from(output_root).join(format!("{document_type}_{id_no_dashes}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfigBuilder;
    use crate::factory::mock::MockBrowserFactory;
    use crate::model::{Branding, DocumentTemplate, PdfOptions, TemplateContent, VariantMap};
    use crate::pool::BrowserPool;

    #[test]
    fn test_output_path_strips_dashes_from_id() {
        let path = output_path("./out", "invoice", "abc-123-def");
        assert_eq!(path, PathBuf::from("./out/invoice_abc123def.pdf"));
    }

    #[test]
    fn test_outcome_for_error_routes_terminal_errors_to_failed() {
        assert_eq!(outcome_for_error(&RenderError::Cancelled), DispatchOutcome::Failed);
        assert_eq!(outcome_for_error(&RenderError::PoolDisposed), DispatchOutcome::Failed);
        assert_eq!(
            outcome_for_error(&RenderError::RenderPdf("boom".into())),
            DispatchOutcome::Retry
        );
    }

    struct NullTransport;

    #[async_trait]
    impl QueueTransport for NullTransport {
        async fn next_request(&self) -> Result<Option<CorrelatedRequest>> {
            Ok(None)
        }

        async fn publish_reply(&self, _reply: CorrelatedResponse) -> Result<()> {
            Ok(())
        }

        async fn report_outcome(&self, _request: &CorrelatedRequest, _outcome: DispatchOutcome) {}
    }

    fn sample_request() -> CorrelatedRequest {
        CorrelatedRequest {
            correlation_id: "corr-1".into(),
            device_id: "device-1".into(),
            session_id: None,
            template: DocumentTemplate {
                document_type: "invoice".into(),
                version: "1".into(),
                branding: Branding::default(),
                template: TemplateContent {
                    html: "<p>hi</p>".into(),
                    ..Default::default()
                },
                variables: VariantMap::new(),
                pdf: PdfOptions::default(),
            },
            return_pdf_inline: true,
            requested_at: chrono::Utc::now(),
        }
    }

    /// Scenario 8: a failing render increments `failure_count` exactly once,
    /// never `success_count`.
    #[tokio::test]
    async fn test_handle_request_increments_failure_count_exactly_once() {
        let config = PoolConfigBuilder::new().min_size(0).max_size(1).build().unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(MockBrowserFactory::always_fails("no chrome here")))
            .enable_reaper(false)
            .build()
            .unwrap();
        let pipeline = Arc::new(Pipeline::new(Arc::new(std::sync::Mutex::new(pool))));
        let transport = NullTransport;
        let cancel = CancelSignal::new();
        let success_count = AtomicU64::new(0);
        let failure_count = AtomicU64::new(0);

        handle_request(
            pipeline,
            &transport,
            "./out",
            sample_request(),
            &cancel,
            &success_count,
            &failure_count,
        )
        .await;

        assert_eq!(success_count.load(Ordering::Relaxed), 0);
        assert_eq!(failure_count.load(Ordering::Relaxed), 1);
    }
}
