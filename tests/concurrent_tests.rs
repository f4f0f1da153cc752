//! Concurrent access tests for the browser pool and the queue dispatcher.

use async_trait::async_trait;
use chrono::Utc;
use docrender_core::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Test concurrent access to pool stats.
#[tokio::test]
async fn test_concurrent_stats_access() {
    let pool = BrowserPool::builder()
        .config(PoolConfigBuilder::new().max_size(5).min_size(0).build().unwrap())
        .factory(Box::new(MockBrowserFactory::always_fails("Test mode")))
        .enable_reaper(false)
        .build()
        .unwrap();

    let shared_pool = Arc::new(std::sync::Mutex::new(pool));

    let mut tasks = JoinSet::new();

    for _ in 0..10 {
        let pool = Arc::clone(&shared_pool);
        tasks.spawn(async move {
            for _ in 0..100 {
                let pool_guard = pool.lock().unwrap();
                let _stats = pool_guard.stats();
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "Task should complete without panic");
    }
}

/// A transport that hands out a fixed number of requests, tracking how many
/// were in flight at once so the dispatcher's semaphore bound can be
/// verified directly.
struct TrackingTransport {
    remaining: std::sync::Mutex<usize>,
    in_flight: AtomicUsize,
    max_observed: AtomicUsize,
}

impl TrackingTransport {
    fn new(count: usize) -> Self {
        Self {
            remaining: std::sync::Mutex::new(count),
            in_flight: AtomicUsize::new(0),
            max_observed: AtomicUsize::new(0),
        }
    }
}

fn sample_request(correlation_id: &str) -> CorrelatedRequest {
    CorrelatedRequest {
        correlation_id: correlation_id.to_string(),
        device_id: "device-1".to_string(),
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
        requested_at: Utc::now(),
    }
}

#[async_trait]
impl QueueTransport for TrackingTransport {
    async fn next_request(&self) -> Result<Option<CorrelatedRequest>> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Ok(None);
        }
        *remaining -= 1;
        let id = format!("job-{remaining}");

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_observed.fetch_max(now, Ordering::SeqCst);

        Ok(Some(sample_request(&id)))
    }

    async fn publish_reply(&self, _reply: CorrelatedResponse) -> Result<()> {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn report_outcome(&self, _request: &CorrelatedRequest, _outcome: DispatchOutcome) {}
}

/// Verifies the queue dispatcher never exceeds `maxConcurrentRenders`
/// in-flight jobs, even with a pool too small to actually complete them —
/// the pool simply makes every job fail fast, which is all this test needs.
#[tokio::test]
async fn test_queue_dispatcher_bounds_concurrency() {
    let pool = BrowserPool::builder()
        .config(PoolConfigBuilder::new().max_size(1).min_size(0).build().unwrap())
        .factory(Box::new(MockBrowserFactory::always_fails("Test mode")))
        .enable_reaper(false)
        .build()
        .unwrap();

    let pipeline = Arc::new(Pipeline::new(Arc::new(std::sync::Mutex::new(pool))));
    let transport = Arc::new(TrackingTransport::new(5));
    let config = QueueConfigBuilder::new()
        .max_concurrent_renders(2)
        .poll_timeout(Duration::from_millis(10))
        .build()
        .unwrap();

    let dispatcher = Arc::new(QueueDispatcher::new(pipeline, transport.clone(), config));
    let cancel = CancelSignal::new();

    let run_cancel = cancel.clone();
    let dispatcher_clone = Arc::clone(&dispatcher);
    let handle = tokio::spawn(async move { dispatcher_clone.run(run_cancel).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;

    assert!(dispatcher.failure_count() + dispatcher.success_count() <= 5);
    assert!(
        transport.max_observed.load(Ordering::SeqCst) <= 2,
        "dispatcher let more than maxConcurrentRenders jobs run at once"
    );
}
