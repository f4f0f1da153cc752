//! Configuration for the browser pool and the queue-mode dispatcher.
//!
//! This module provides [`PoolConfig`]/[`PoolConfigBuilder`] for the browser
//! pool's size and recycling behavior, and [`QueueConfig`]/[`QueueConfigBuilder`]
//! for the queue-mode dispatcher's transport wiring and concurrency limits.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use docrender_core::PoolConfigBuilder;
//!
//! let config = PoolConfigBuilder::new()
//!     .max_size(10)
//!     .min_size(2)
//!     .acquire_timeout(Duration::from_secs(30))
//!     .build()
//!     .expect("invalid configuration");
//!
//! assert_eq!(config.max_size, 10);
//! assert_eq!(config.min_size, 2);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, both configs can be loaded from
//! environment variables and an optional `app.env` file:
//!
//! ```rust,ignore
//! use docrender_core::config::env::{pool_config_from_env, queue_config_from_env};
//!
//! let pool = pool_config_from_env()?;
//! let queue = queue_config_from_env()?;
//! ```
//!
//! See [`mod@env`] for the full variable list.

use std::time::Duration;

/// Configuration for browser pool behavior and limits.
///
/// Controls pool capacity, lease wait time, idle reaping, and per-instance
/// recycling. Use [`PoolConfigBuilder`] for validation and convenience.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `min_size` | 1 | Warm instances to retain during reaping |
/// | `max_size` | 4 | Hard cap on concurrent leases |
/// | `acquire_timeout` | 30s | Max wait for a lease |
/// | `idle_timeout` | 5 min | Idle age after which the reaper may close an instance |
/// | `max_renders_per_instance` | 100 | Renders before forced recycle (`None` disables) |
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Warm instances to retain during idle reaping.
    pub min_size: usize,

    /// Hard cap on concurrent leases (the semaphore's permit count).
    pub max_size: usize,

    /// Maximum time a caller waits for a lease before `PoolTimeout`.
    pub acquire_timeout: Duration,

    /// Idle age after which the reaper may close an instance. `None`
    /// disables the idle reaper entirely.
    pub idle_timeout: Option<Duration>,

    /// Renders served before an instance is recycled instead of
    /// requeued. `None` disables the recycle threshold.
    pub max_renders_per_instance: Option<u64>,
}

impl Default for PoolConfig {
    /// Production-ready default configuration.
    ///
    /// - `min_size`: 1
    /// - `max_size`: 4
    /// - `acquire_timeout`: 30s
    /// - `idle_timeout`: 5 minutes
    /// - `max_renders_per_instance`: 100
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 4,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(300)),
            max_renders_per_instance: Some(100),
        }
    }
}

impl PoolConfig {
    /// The idle reaper's wake interval: `max(30s, idleTimeout/2)`.
    ///
    /// Returns `None` when `idle_timeout` is disabled (the reaper does not
    /// run at all).
    pub fn reaper_interval(&self) -> Option<Duration> {
        self.idle_timeout
            .map(|timeout| std::cmp::max(Duration::from_secs(30), timeout / 2))
    }
}

/// Builder for [`PoolConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use docrender_core::PoolConfigBuilder;
///
/// let config = PoolConfigBuilder::new()
///     .max_size(10)
///     .min_size(2)
///     .idle_timeout(Some(Duration::from_secs(600)))
///     .build()
///     .expect("invalid configuration");
/// ```
///
/// # Validation
///
/// The [`build()`](Self::build) method validates:
/// - `max_size` must be greater than 0
/// - `min_size` must not exceed `max_size`
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    /// Set the warm-instance floor the reaper will not go below.
    pub fn min_size(mut self, size: usize) -> Self {
        self.config.min_size = size;
        self
    }

    /// Set the hard cap on concurrent leases (must be > 0).
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = size;
        self
    }

    /// Set the maximum wait for a lease before timing out.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    /// Set the idle age after which the reaper may close an instance.
    /// Pass `None` to disable the idle reaper.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the render count past which an instance is recycled instead
    /// of requeued. Pass `None` to disable.
    pub fn max_renders_per_instance(mut self, max: Option<u64>) -> Self {
        self.config.max_renders_per_instance = max;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Returns an error if `max_size` is 0.
    /// - Returns an error if `min_size` exceeds `max_size`.
    pub fn build(self) -> std::result::Result<PoolConfig, String> {
        if self.config.max_size == 0 {
            return Err("max_size must be greater than 0".to_string());
        }

        if self.config.min_size > self.config.max_size {
            return Err("min_size cannot exceed max_size".to_string());
        }

        Ok(self.config)
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the queue-mode dispatcher's transport wiring and
/// in-flight render bound.
///
/// # Fields Overview
///
/// | Field | Default |
/// |-------|---------|
/// | `max_retries` | 3 |
/// | `retry_delay` | 1s (doubled per attempt) |
/// | `poll_timeout` | 5s |
/// | `max_concurrent_renders` | 4 |
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Broker connection string, opaque to the core.
    pub bootstrap_servers: String,
    /// Consumer group id, opaque to the core.
    pub consumer_group_id: String,
    /// Topic carrying inbound render requests.
    pub request_topic: String,
    /// Topic carrying outbound render results.
    pub result_topic: String,
    /// Topic carrying requests that exhausted `max_retries`.
    pub dead_letter_topic: String,
    /// Number of retry attempts before dead-lettering.
    pub max_retries: u32,
    /// Base delay between retries; doubled per attempt
    /// (`retryDelay * 2^(attempt-1)`).
    pub retry_delay: Duration,
    /// How long a single transport poll blocks waiting for a message.
    pub poll_timeout: Duration,
    /// Upper bound on renders in flight at once.
    pub max_concurrent_renders: usize,
    /// Root directory non-inline PDFs are written under.
    pub pdf_output_path: String,
    /// Broker security protocol, opaque to the core.
    pub security_protocol: Option<String>,
    /// SASL mechanism, opaque to the core.
    pub sasl_mechanism: Option<String>,
    /// SASL username, opaque to the core.
    pub sasl_username: Option<String>,
    /// SASL password, opaque to the core.
    pub sasl_password: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: String::new(),
            consumer_group_id: "docrender".to_string(),
            request_topic: "render.requests".to_string(),
            result_topic: "render.results".to_string(),
            dead_letter_topic: "render.dead-letter".to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(5),
            max_concurrent_renders: 4,
            pdf_output_path: "./output".to_string(),
            security_protocol: None,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
        }
    }
}

impl QueueConfig {
    /// Delay before the `attempt`-th retry (1-indexed), per
    /// `retryDelay * 2^(attempt-1)`.
    pub fn retry_delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Warn if `max_concurrent_renders` exceeds the pool's `max_size`,
    /// per the backpressure-coupling design note: a misconfiguration here
    /// is detectable, not silently absorbed.
    pub fn warn_if_misconfigured_against(&self, pool_max_size: usize) {
        if self.max_concurrent_renders > pool_max_size {
            log::warn!(
                "⚠️ Queue.MaxConcurrentRenders ({}) exceeds BrowserPool.MaxSize ({}); renders will \
                 queue on the pool semaphore instead of the dispatcher's own limit",
                self.max_concurrent_renders,
                pool_max_size
            );
        }
    }
}

/// Builder for [`QueueConfig`] with validation.
pub struct QueueConfigBuilder {
    config: QueueConfig,
}

impl QueueConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: QueueConfig::default(),
        }
    }

    /// Set the broker connection string.
    pub fn bootstrap_servers(mut self, value: impl Into<String>) -> Self {
        self.config.bootstrap_servers = value.into();
        self
    }

    /// Set the consumer group id.
    pub fn consumer_group_id(mut self, value: impl Into<String>) -> Self {
        self.config.consumer_group_id = value.into();
        self
    }

    /// Set the inbound request topic.
    pub fn request_topic(mut self, value: impl Into<String>) -> Self {
        self.config.request_topic = value.into();
        self
    }

    /// Set the outbound result topic.
    pub fn result_topic(mut self, value: impl Into<String>) -> Self {
        self.config.result_topic = value.into();
        self
    }

    /// Set the dead-letter topic.
    pub fn dead_letter_topic(mut self, value: impl Into<String>) -> Self {
        self.config.dead_letter_topic = value.into();
        self
    }

    /// Set the number of retries before dead-lettering.
    pub fn max_retries(mut self, value: u32) -> Self {
        self.config.max_retries = value;
        self
    }

    /// Set the base retry delay.
    pub fn retry_delay(mut self, value: Duration) -> Self {
        self.config.retry_delay = value;
        self
    }

    /// Set the transport poll timeout.
    pub fn poll_timeout(mut self, value: Duration) -> Self {
        self.config.poll_timeout = value;
        self
    }

    /// Set the in-flight render concurrency bound.
    pub fn max_concurrent_renders(mut self, value: usize) -> Self {
        self.config.max_concurrent_renders = value;
        self
    }

    /// Set the root directory non-inline PDFs are written under.
    pub fn pdf_output_path(mut self, value: impl Into<String>) -> Self {
        self.config.pdf_output_path = value.into();
        self
    }

    /// Set the broker security protocol.
    pub fn security_protocol(mut self, value: impl Into<String>) -> Self {
        self.config.security_protocol = Some(value.into());
        self
    }

    /// Set the SASL mechanism.
    pub fn sasl_mechanism(mut self, value: impl Into<String>) -> Self {
        self.config.sasl_mechanism = Some(value.into());
        self
    }

    /// Set the SASL username.
    pub fn sasl_username(mut self, value: impl Into<String>) -> Self {
        self.config.sasl_username = Some(value.into());
        self
    }

    /// Set the SASL password.
    pub fn sasl_password(mut self, value: impl Into<String>) -> Self {
        self.config.sasl_password = Some(value.into());
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_concurrent_renders` is 0.
    pub fn build(self) -> std::result::Result<QueueConfig, String> {
        if self.config.max_concurrent_renders == 0 {
            return Err("max_concurrent_renders must be greater than 0".to_string());
        }
        Ok(self.config)
    }
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading for [`PoolConfig`] and
/// [`QueueConfig`].
///
/// This module is only available when the `env-config` feature is enabled.
///
/// # Environment File
///
/// Uses `dotenvy` to load environment variables from an `app.env` file in
/// the current directory. The file is optional.
///
/// # Pool variables
///
/// | Variable | Type | Default |
/// |----------|------|---------|
/// | `POOL_MIN_SIZE` | usize | 1 |
/// | `POOL_MAX_SIZE` | usize | 4 |
/// | `POOL_ACQUIRE_TIMEOUT_SECONDS` | u64 | 30 |
/// | `POOL_IDLE_TIMEOUT_SECONDS` | u64 (0 disables) | 300 |
/// | `POOL_MAX_RENDERS_PER_INSTANCE` | u64 (0 disables) | 100 |
/// | `CHROME_PATH` | String | auto |
///
/// # Queue variables
///
/// | Variable | Type | Default |
/// |----------|------|---------|
/// | `QUEUE_BOOTSTRAP_SERVERS` | String | empty |
/// | `QUEUE_CONSUMER_GROUP_ID` | String | `docrender` |
/// | `QUEUE_REQUEST_TOPIC` | String | `render.requests` |
/// | `QUEUE_RESULT_TOPIC` | String | `render.results` |
/// | `QUEUE_DEAD_LETTER_TOPIC` | String | `render.dead-letter` |
/// | `QUEUE_MAX_RETRIES` | u32 | 3 |
/// | `QUEUE_RETRY_DELAY_SECONDS` | u64 | 1 |
/// | `QUEUE_POLL_TIMEOUT_SECONDS` | u64 | 5 |
/// | `QUEUE_MAX_CONCURRENT_RENDERS` | usize | 4 |
/// | `QUEUE_PDF_OUTPUT_PATH` | String | `./output` |
/// | `QUEUE_SECURITY_PROTOCOL` | String | unset |
/// | `QUEUE_SASL_MECHANISM` | String | unset |
/// | `QUEUE_SASL_USERNAME` | String | unset |
/// | `QUEUE_SASL_PASSWORD` | String | unset |
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::RenderError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from `app.env` file.
    ///
    /// Call this early in your application startup to ensure environment
    /// variables are loaded before any configuration functions are called.
    /// Automatically invoked by [`pool_config_from_env`] and
    /// [`queue_config_from_env`].
    pub fn load_env_file() -> std::result::Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    /// Load [`PoolConfig`] from environment variables (see module docs for
    /// the variable list).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] if the resulting configuration
    /// fails validation.
    pub fn pool_config_from_env() -> Result<PoolConfig, RenderError> {
        match load_env_file() {
            Ok(path) => log::info!(" Loaded configuration from: {:?}", path),
            Err(e) => log::debug!(
                " No {} file found or failed to load: {} (using environment variables and defaults)",
                ENV_FILE_NAME,
                e
            ),
        }

        let min_size = env_parse("POOL_MIN_SIZE", 1usize);
        let max_size = env_parse("POOL_MAX_SIZE", 4usize);
        let acquire_timeout_secs = env_parse("POOL_ACQUIRE_TIMEOUT_SECONDS", 30u64);
        let idle_timeout_secs = env_parse("POOL_IDLE_TIMEOUT_SECONDS", 300u64);
        let max_renders = env_parse("POOL_MAX_RENDERS_PER_INSTANCE", 100u64);

        log::info!(" Loading pool configuration from environment:");
        log::info!("   - Min size: {}", min_size);
        log::info!("   - Max size: {}", max_size);
        log::info!("   - Acquire timeout: {}s", acquire_timeout_secs);
        log::info!(
            "   - Idle timeout: {}",
            if idle_timeout_secs == 0 {
                "disabled".to_string()
            } else {
                format!("{}s", idle_timeout_secs)
            }
        );
        log::info!(
            "   - Max renders per instance: {}",
            if max_renders == 0 {
                "unlimited".to_string()
            } else {
                max_renders.to_string()
            }
        );

        PoolConfigBuilder::new()
            .min_size(min_size)
            .max_size(max_size)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(if idle_timeout_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(idle_timeout_secs))
            })
            .max_renders_per_instance(if max_renders == 0 {
                None
            } else {
                Some(max_renders)
            })
            .build()
            .map_err(RenderError::Configuration)
    }

    /// Get Chrome path from environment (`CHROME_PATH`).
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok()
    }

    /// Load [`QueueConfig`] from environment variables (see module docs for
    /// the variable list).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] if the resulting configuration
    /// fails validation.
    pub fn queue_config_from_env() -> Result<QueueConfig, RenderError> {
        let _ = load_env_file();

        let bootstrap_servers = std::env::var("QUEUE_BOOTSTRAP_SERVERS").unwrap_or_default();
        let consumer_group_id =
            std::env::var("QUEUE_CONSUMER_GROUP_ID").unwrap_or_else(|_| "docrender".to_string());
        let request_topic = std::env::var("QUEUE_REQUEST_TOPIC")
            .unwrap_or_else(|_| "render.requests".to_string());
        let result_topic =
            std::env::var("QUEUE_RESULT_TOPIC").unwrap_or_else(|_| "render.results".to_string());
        let dead_letter_topic = std::env::var("QUEUE_DEAD_LETTER_TOPIC")
            .unwrap_or_else(|_| "render.dead-letter".to_string());
        let max_retries = env_parse("QUEUE_MAX_RETRIES", 3u32);
        let retry_delay_secs = env_parse("QUEUE_RETRY_DELAY_SECONDS", 1u64);
        let poll_timeout_secs = env_parse("QUEUE_POLL_TIMEOUT_SECONDS", 5u64);
        let max_concurrent_renders = env_parse("QUEUE_MAX_CONCURRENT_RENDERS", 4usize);
        let pdf_output_path =
            std::env::var("QUEUE_PDF_OUTPUT_PATH").unwrap_or_else(|_| "./output".to_string());

        log::info!(" Loading queue configuration from environment:");
        log::info!("   - Request topic: {}", request_topic);
        log::info!("   - Result topic: {}", result_topic);
        log::info!("   - Dead-letter topic: {}", dead_letter_topic);
        log::info!("   - Max retries: {}", max_retries);
        log::info!("   - Max concurrent renders: {}", max_concurrent_renders);
        log::info!("   - PDF output path: {}", pdf_output_path);

        QueueConfigBuilder::new()
            .bootstrap_servers(bootstrap_servers)
            .consumer_group_id(consumer_group_id)
            .request_topic(request_topic)
            .result_topic(result_topic)
            .dead_letter_topic(dead_letter_topic)
            .max_retries(max_retries)
            .retry_delay(Duration::from_secs(retry_delay_secs))
            .poll_timeout(Duration::from_secs(poll_timeout_secs))
            .max_concurrent_renders(max_concurrent_renders)
            .pdf_output_path(pdf_output_path)
            .build()
            .map_err(RenderError::Configuration)
    }

    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfigBuilder::new()
            .max_size(10)
            .min_size(2)
            .acquire_timeout(Duration::from_secs(45))
            .idle_timeout(Some(Duration::from_secs(120)))
            .max_renders_per_instance(Some(50))
            .build()
            .unwrap();

        assert_eq!(config.max_size, 10);
        assert_eq!(config.min_size, 2);
        assert_eq!(config.acquire_timeout.as_secs(), 45);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.max_renders_per_instance, Some(50));
    }

    #[test]
    fn test_pool_config_rejects_zero_max_size() {
        let result = PoolConfigBuilder::new().max_size(0).build();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("max_size must be greater than 0"));
    }

    #[test]
    fn test_pool_config_rejects_min_exceeding_max() {
        let result = PoolConfigBuilder::new().max_size(2).min_size(5).build();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("min_size cannot exceed max_size"));
    }

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.min_size, 1);
        assert_eq!(config.max_size, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.max_renders_per_instance, Some(100));
    }

    #[test]
    fn test_reaper_interval_is_at_least_30s() {
        let config = PoolConfigBuilder::new()
            .idle_timeout(Some(Duration::from_secs(20)))
            .build()
            .unwrap();
        assert_eq!(config.reaper_interval(), Some(Duration::from_secs(30)));

        let config = PoolConfigBuilder::new()
            .idle_timeout(Some(Duration::from_secs(600)))
            .build()
            .unwrap();
        assert_eq!(config.reaper_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_reaper_disabled_when_idle_timeout_none() {
        let config = PoolConfigBuilder::new().idle_timeout(None).build().unwrap();
        assert_eq!(config.reaper_interval(), None);
    }

    #[test]
    fn test_queue_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.max_concurrent_renders, 4);
    }

    #[test]
    fn test_queue_config_rejects_zero_concurrency() {
        let result = QueueConfigBuilder::new().max_concurrent_renders(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_retry_delay_doubles_per_attempt() {
        let config = QueueConfigBuilder::new()
            .retry_delay(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(config.retry_delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.retry_delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.retry_delay_for_attempt(3), Duration::from_secs(4));
    }
}
