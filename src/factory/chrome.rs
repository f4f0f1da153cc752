//! Chrome/Chromium browser factory implementation.
//!
//! This module provides [`ChromeBrowserFactory`] for launching headless
//! Chrome instances with the fixed argument set required by SPEC_FULL.md
//! §4.2 ("Launch arguments").
//!
//! # Overview
//!
//! The factory handles:
//! - Chrome binary path detection (or custom path)
//! - Launch options configuration
//! - Memory and stability optimizations
//!
//! # Example
//!
//! ```rust,ignore
//! use docrender_core::ChromeBrowserFactory;
//!
//! // Auto-detect Chrome installation
//! let factory = ChromeBrowserFactory::with_defaults();
//!
//! // Or specify custom path
//! let factory = ChromeBrowserFactory::with_path("/usr/bin/google-chrome".to_string());
//! ```

use headless_chrome::{Browser, LaunchOptions};

use super::BrowserFactory;
use crate::error::{RenderError, Result};

/// Factory for creating Chrome/Chromium browser instances.
///
/// Handles Chrome-specific launch options and path detection.
/// Supports both auto-detection and custom Chrome binary paths.
///
/// # Thread Safety
///
/// This factory is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```rust,ignore
/// use docrender_core::ChromeBrowserFactory;
///
/// // Auto-detect Chrome
/// let factory = ChromeBrowserFactory::with_defaults();
///
/// // Or use custom path
/// let factory = ChromeBrowserFactory::with_path("/usr/bin/google-chrome".to_string());
/// ```
pub struct ChromeBrowserFactory {
    /// Function that generates launch options for each browser.
    ///
    /// This allows dynamic configuration per browser instance.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeBrowserFactory {
    /// Create factory with custom launch options function.
    ///
    /// This is the most flexible constructor, allowing full control
    /// over launch options generation.
    ///
    /// # Parameters
    ///
    /// * `launch_options_fn` - Function called for each browser creation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use docrender_core::{ChromeBrowserFactory, create_chrome_options, RenderError};
    ///
    /// let factory = ChromeBrowserFactory::new(|| {
    ///     // Custom logic here
    ///     create_chrome_options(Some("/custom/path"))
    ///         .map_err(|e| RenderError::Configuration(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Create factory with auto-detected Chrome path.
    ///
    /// This is the recommended default - lets headless_chrome find Chrome.
    /// Works on Linux, macOS, and Windows.
    ///
    /// # Platform Detection
    ///
    /// The `headless_chrome` crate searches common installation paths:
    ///
    /// | Platform | Paths Searched |
    /// |----------|----------------|
    /// | Linux | `/usr/bin/google-chrome`, `/usr/bin/chromium`, etc. |
    /// | macOS | `/Applications/Google Chrome.app/...` |
    /// | Windows | `C:\Program Files\Google\Chrome\...` |
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use docrender_core::ChromeBrowserFactory;
    ///
    /// let factory = ChromeBrowserFactory::with_defaults();
    /// ```
    pub fn with_defaults() -> Self {
        log::debug!(" Creating ChromeBrowserFactory with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| RenderError::Configuration(e.to_string()))
        })
    }

    /// Create factory with custom Chrome binary path.
    ///
    /// Use this when Chrome is installed in a non-standard location.
    ///
    /// # Parameters
    ///
    /// * `chrome_path` - Full path to Chrome/Chromium binary.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use docrender_core::ChromeBrowserFactory;
    ///
    /// // Linux
    /// let factory = ChromeBrowserFactory::with_path("/usr/bin/google-chrome".to_string());
    ///
    /// // macOS
    /// let factory = ChromeBrowserFactory::with_path(
    ///     "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string()
    /// );
    ///
    /// // Windows
    /// let factory = ChromeBrowserFactory::with_path(
    ///     r"C:\Program Files\Google\Chrome\Application\chrome.exe".to_string()
    /// );
    /// ```
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!(" Creating ChromeBrowserFactory with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| RenderError::Configuration(e.to_string()))
        })
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    /// Create a new Chrome browser instance.
    ///
    /// Calls the launch options function and launches Chrome with those options.
    ///
    /// # Errors
    ///
    /// * Returns [`RenderError::Configuration`] if launch options generation fails.
    /// * Returns [`RenderError::BrowserCreation`] if Chrome fails to launch.
    fn create(&self) -> Result<Browser> {
        log::trace!(" ChromeBrowserFactory::create() called");

        let options = (self.launch_options_fn)()?;

        log::debug!(" Launching Chrome browser...");
        Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            RenderError::BrowserCreation(e.to_string())
        })
    }
}

/// Create Chrome launch options with optional custom path.
///
/// Generates the fixed argument set SPEC_FULL.md §4.2 requires for every
/// pooled browser: headless, sandbox disabled (container-friendly), and
/// GPU/extensions/background-networking/sync/first-run/audio all disabled.
///
/// # Parameters
///
/// * `chrome_path` - Optional custom Chrome binary path. If None, auto-detects.
///
/// # Returns
///
/// LaunchOptions configured for stable headless operation.
///
/// # Errors
///
/// Returns error if options builder fails (rare, usually a bug).
///
/// # Chrome Flags Applied
///
/// ## Sandboxing and Memory
/// - `--disable-dev-shm-usage` - Use /tmp instead of /dev/shm (container-friendly)
/// - `--disable-crash-reporter` - No crash reporting
/// - `--max_old_space_size=1024` - Limit V8 heap to 1GB
///
/// ## GPU and Rendering
/// - `--disable-gpu`
/// - `--disable-gpu-compositing`
/// - `--disable-software-rasterizer`
/// - `--disable-accelerated-2d-canvas`
/// - `--disable-gl-drawing-for-tests`
/// - `--disable-webgl`
/// - `--disable-webgl2`
///
/// ## Disabled Features
/// - `--disable-extensions`
/// - `--disable-plugins`
/// - `--disable-sync`
/// - `--disable-default-apps`
/// - `--disable-background-networking`
/// - `--no-first-run`
/// - `--mute-audio`
///
/// ## Security and Automation
/// - `--disable-web-security` - Allow cross-origin requests (for scraping)
/// - `--enable-automation` - Mark as automated browser
///
/// ## Stability
/// - `--disable-background-timer-throttling`
/// - `--disable-backgrounding-occluded-windows`
/// - `--disable-hang-monitor`
/// - `--disable-popup-blocking`
/// - `--disable-renderer-backgrounding`
/// - `--disable-ipc-flooding-protection`
///
/// # Example
///
/// ```rust,ignore
/// use docrender_core::create_chrome_options;
///
/// // Auto-detect Chrome path
/// let options = create_chrome_options(None)?;
///
/// // Custom Chrome path
/// let options = create_chrome_options(Some("/usr/bin/chromium"))?;
/// ```
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!(" Creating Chrome options with custom path: {}", path),
        None => log::debug!(" Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    // Set path if provided, otherwise let headless_chrome auto-detect
    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
        log::trace!(" Chrome path set to: {}", path);
    } else {
        log::trace!(" Chrome path: auto-detect");
    }

    // Configure launch options for stable headless operation
    builder
        .headless(true)
        .sandbox(false)
        .disable_default_args(true)
        .args(vec![
            // ===== Memory and Performance Optimization =====
            "--disable-dev-shm-usage".as_ref(),
            "--disable-crash-reporter".as_ref(),
            "--max_old_space_size=1024".as_ref(),

            // ===== GPU and Rendering Flags =====
            "--disable-gpu".as_ref(),
            "--disable-gpu-compositing".as_ref(),
            "--disable-software-rasterizer".as_ref(),
            "--disable-accelerated-2d-canvas".as_ref(),
            "--disable-gl-drawing-for-tests".as_ref(),
            "--disable-webgl".as_ref(),
            "--disable-webgl2".as_ref(),

            // ===== Disable Unnecessary Features =====
            "--disable-extensions".as_ref(),
            "--disable-plugins".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
            "--disable-background-networking".as_ref(),
            "--no-first-run".as_ref(),
            "--mute-audio".as_ref(),

            // ===== Security and Functionality =====
            "--disable-web-security".as_ref(),

            // ===== Automation and Debugging =====
            "--enable-automation".as_ref(),

            // ===== Stability and Performance =====
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-hang-monitor".as_ref(),

            // ===== UI Flags =====
            "--disable-popup-blocking".as_ref(),

            // ===== Better CDP (Chrome DevTools Protocol) Stability =====
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!("❌ Failed to build Chrome launch options (path: {}): {}", path_msg, e);
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that ChromeBrowserFactory can be instantiated.
    ///
    /// Tests that factory construction works with both auto-detect
    /// and custom path modes. Does not actually create browsers.
    #[test]
    fn test_chrome_factory_creation() {
        let _factory = ChromeBrowserFactory::with_defaults();
        let _factory_with_path = ChromeBrowserFactory::with_path("/custom/chrome/path".to_string());
    }

    /// Verifies that Chrome launch options can be built.
    ///
    /// Tests the option builder for both auto-detect and custom path modes.
    /// This verifies the configuration is valid, but doesn't launch Chrome.
    #[test]
    fn test_create_chrome_options() {
        let result = create_chrome_options(None);
        assert!(
            result.is_ok(),
            "Auto-detect Chrome options should build successfully: {:?}",
            result.err()
        );

        let result = create_chrome_options(Some("/custom/chrome/path"));
        assert!(
            result.is_ok(),
            "Custom path Chrome options should build successfully: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_required_flags_present() {
        let options = create_chrome_options(None).expect("options should build");
        let args: Vec<String> = options
            .args
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect();
        for required in [
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--disable-sync",
            "--disable-background-networking",
            "--no-first-run",
            "--mute-audio",
        ] {
            assert!(args.iter().any(|a| a == required), "missing flag: {required}");
        }
    }
}
