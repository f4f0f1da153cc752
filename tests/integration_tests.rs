//! Integration tests for the browser pool.

use docrender_core::prelude::*;
use std::time::Duration;

/// Test that pool can be created with default configuration.
#[tokio::test]
async fn test_pool_creation() {
    let result = BrowserPool::builder()
        .config(
            PoolConfigBuilder::new()
                .max_size(2)
                .min_size(0) // No warmup to avoid needing Chrome
                .build()
                .unwrap(),
        )
        .factory(Box::new(MockBrowserFactory::always_fails("Test mode")))
        .enable_reaper(false)
        .build();

    assert!(result.is_ok(), "Pool creation should succeed");
}

/// Test that pool stats work correctly.
#[tokio::test]
async fn test_pool_stats() {
    let pool = BrowserPool::builder()
        .config(PoolConfigBuilder::new().max_size(5).min_size(0).build().unwrap())
        .factory(Box::new(MockBrowserFactory::always_fails("Test mode")))
        .enable_reaper(false)
        .build()
        .unwrap();

    let stats = pool.stats();

    assert_eq!(stats.idle, 0);
    assert_eq!(stats.active, 0);
}

/// Test configuration validation.
#[test]
fn test_config_validation() {
    // Zero pool size should fail
    let result = PoolConfigBuilder::new().max_size(0).build();
    assert!(result.is_err());

    // min_size > max_size should fail
    let result = PoolConfigBuilder::new().max_size(3).min_size(5).build();
    assert!(result.is_err());

    // Valid config should succeed
    let result = PoolConfigBuilder::new()
        .max_size(5)
        .min_size(3)
        .acquire_timeout(Duration::from_secs(30))
        .build();
    assert!(result.is_ok());
}

/// Test that shutdown prevents new operations.
#[tokio::test]
async fn test_shutdown_prevents_operations() {
    let mut pool = BrowserPool::builder()
        .config(PoolConfigBuilder::new().max_size(2).min_size(0).build().unwrap())
        .factory(Box::new(MockBrowserFactory::always_fails("Test mode")))
        .enable_reaper(false)
        .build()
        .unwrap();

    pool.shutdown();

    let result = pool.get();
    assert!(matches!(result, Err(RenderError::PoolDisposed)));
}

/// Test that a pipeline built on a pool of always-failing browsers surfaces
/// the renderer's error unchanged, rather than swallowing it into a partial
/// result.
#[tokio::test]
async fn test_pipeline_propagates_browser_creation_failure() {
    let pool = BrowserPool::builder()
        .config(PoolConfigBuilder::new().max_size(1).min_size(0).build().unwrap())
        .factory(Box::new(MockBrowserFactory::always_fails("no chrome here")))
        .enable_reaper(false)
        .build()
        .unwrap();

    let pipeline = Pipeline::new(std::sync::Arc::new(std::sync::Mutex::new(pool)));

    let template = DocumentTemplate {
        document_type: "invoice".into(),
        version: "1".into(),
        branding: Branding::default(),
        template: TemplateContent {
            html: "<p>{{variables.name}}</p>".into(),
            ..Default::default()
        },
        variables: {
            let mut v = VariantMap::new();
            v.insert("name", Variant::String("Alice".into()));
            v
        },
        pdf: PdfOptions::default(),
    };
    let request = RenderRequest::new(Some("job-1".into()), template);
    let cancel = CancelSignal::new();

    let result = pipeline.execute(&request, &cancel);
    assert!(result.is_err(), "pipeline should surface the pool's error unchanged");
}
