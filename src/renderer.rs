//! PDF renderer (C4) — turns rendered HTML into PDF bytes via a leased
//! browser.
//!
//! Mirrors the teacher's `generate_pdf_internal`/`build_print_options`/
//! `wait_for_page_ready` trio, adapted to SPEC_FULL.md §4.3's contract:
//! network-idle detection (rather than a `window.isPageDone` poll) and the
//! full `PdfOptions` → `PrintToPdfOptions` mapping from §6.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::browser::tab::Event;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::Tab;

use crate::cancel::CancelSignal;
use crate::error::{RenderError, Result};
use crate::lease::Lease;
use crate::model::{Margins, PaperFormat, PdfOptions};

/// Maximum time to wait for the page to reach network idle before giving up
/// and proceeding with PDF generation anyway.
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the in-flight request count must stay at zero before the page
/// is considered idle. Mirrors the "networkidle0" convention used by
/// headless-browser automation tools generally.
const NETWORK_IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Render `html` to PDF bytes using a browser from `lease`.
///
/// # Errors
///
/// - [`RenderError::Cancelled`] if `cancel` fires before or during the
///   operation.
/// - [`RenderError::RenderLoad`] if the page fails to open or navigate.
/// - [`RenderError::RenderPdf`] if PDF generation itself fails.
///
/// On either of the latter two, `lease` is invalidated before the error is
/// returned — the browser is assumed to be in a bad state.
pub fn render_pdf(
    lease: &Lease,
    html: &str,
    pdf_options: &PdfOptions,
    cancel: &CancelSignal,
) -> Result<Vec<u8>> {
    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }

    let start = Instant::now();

    let tab = lease.new_tab().map_err(|e| {
        log::error!("❌ Failed to create tab: {e}");
        RenderError::RenderLoad(e.to_string())
    })?;

    let result = render_on_tab(&tab, html, pdf_options, cancel, start);

    close_tab_safely(&tab);

    result
}

fn render_on_tab(
    tab: &Arc<Tab>,
    html: &str,
    pdf_options: &PdfOptions,
    cancel: &CancelSignal,
    start: Instant,
) -> Result<Vec<u8>> {
    let data_url = format!("data:text/html;charset=utf-8,{}", urlencoding::encode(html));

    log::trace!(" Loading {} bytes of HTML via data URL", html.len());

    let in_flight = Arc::new(AtomicI64::new(0));
    let listener_ref = Arc::clone(&in_flight);
    tab.add_event_listener(Arc::new(move |event: &Event| match event {
        Event::NetworkRequestWillBeSent(_) => {
            listener_ref.fetch_add(1, Ordering::SeqCst);
        }
        Event::NetworkLoadingFinished(_) | Event::NetworkLoadingFailed(_) => {
            listener_ref.fetch_sub(1, Ordering::SeqCst);
        }
        _ => {}
    }))
    .map_err(|e| RenderError::RenderLoad(format!("failed to register network listener: {e}")))?;

    let nav_start = Instant::now();
    tab.navigate_to(&data_url)
        .map_err(|e| {
            log::error!("❌ Failed to navigate: {e}");
            RenderError::RenderLoad(e.to_string())
        })?
        .wait_until_navigated()
        .map_err(|e| {
            log::error!("❌ Navigation timeout: {e}");
            RenderError::RenderLoad(e.to_string())
        })?;

    log::debug!(" Navigation completed in {:?}", nav_start.elapsed());

    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }

    wait_for_network_idle(&in_flight, cancel)?;

    let print_options = build_print_options(pdf_options);

    log::trace!("Generating PDF");
    let pdf_start = Instant::now();
    let pdf_data = tab.print_to_pdf(print_options).map_err(|e| {
        log::error!("❌ PDF generation failed: {e}");
        RenderError::RenderPdf(e.to_string())
    })?;

    log::debug!(
        " PDF generated in {:?} ({} bytes, total {:?})",
        pdf_start.elapsed(),
        pdf_data.len(),
        start.elapsed()
    );

    Ok(pdf_data)
}

/// Poll `in_flight` until it has held at zero for
/// [`NETWORK_IDLE_QUIET_PERIOD`], or [`NETWORK_IDLE_TIMEOUT`] elapses,
/// whichever comes first. Never fails on timeout — reaching the timeout is
/// a normal completion path, matching the teacher's `wait_for_page_ready`.
fn wait_for_network_idle(in_flight: &AtomicI64, cancel: &CancelSignal) -> Result<()> {
    let start = Instant::now();
    let mut quiet_since: Option<Instant> = None;

    loop {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        if start.elapsed() >= NETWORK_IDLE_TIMEOUT {
            log::debug!(" Network idle wait timed out after {:?}, proceeding anyway", start.elapsed());
            return Ok(());
        }

        let idle_now = in_flight.load(Ordering::SeqCst) <= 0;
        match (idle_now, quiet_since) {
            (true, None) => quiet_since = Some(Instant::now()),
            (true, Some(since)) if since.elapsed() >= NETWORK_IDLE_QUIET_PERIOD => {
                log::debug!(" Network idle after {:?}", start.elapsed());
                return Ok(());
            }
            (false, _) => quiet_since = None,
            _ => {}
        }

        std::thread::sleep(NETWORK_POLL_INTERVAL);
    }
}

/// Map [`PdfOptions`] onto the bit-exact `PrintToPdfOptions` contract from
/// SPEC_FULL.md §6.
fn build_print_options(options: &PdfOptions) -> Option<PrintToPdfOptions> {
    let (paper_width, paper_height) = if options.has_explicit_size() {
        (
            parse_css_length_inches(options.width.as_deref().unwrap_or_default()),
            parse_css_length_inches(options.height.as_deref().unwrap_or_default()),
        )
    } else {
        PaperFormat::parse(&options.format).dimensions_inches()
    };

    let (margin_top, margin_bottom, margin_left, margin_right) = margins_in_inches(options.margins.as_ref());

    let (header_template, footer_template) = if options.has_header_or_footer() {
        (
            Some(options.header_template.clone().unwrap_or_else(|| "<span></span>".to_string())),
            Some(options.footer_template.clone().unwrap_or_else(|| "<span></span>".to_string())),
        )
    } else {
        (None, None)
    };

    Some(PrintToPdfOptions {
        landscape: Some(options.landscape),
        display_header_footer: Some(options.has_header_or_footer()),
        print_background: Some(options.print_background),
        scale: Some(options.clamped_scale()),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margin_top),
        margin_bottom: Some(margin_bottom),
        margin_left: Some(margin_left),
        margin_right: Some(margin_right),
        header_template,
        footer_template,
        ..Default::default()
    })
}

/// `0.0` for any side left unset, matching §6's "nulls fall through to
/// browser defaults" — the browser's own default happens to be `0`.
fn margins_in_inches(margins: Option<&Margins>) -> (f64, f64, f64, f64) {
    match margins {
        None => (0.0, 0.0, 0.0, 0.0),
        Some(m) => (
            m.top.as_deref().map(parse_css_length_inches).unwrap_or(0.0),
            m.bottom.as_deref().map(parse_css_length_inches).unwrap_or(0.0),
            m.left.as_deref().map(parse_css_length_inches).unwrap_or(0.0),
            m.right.as_deref().map(parse_css_length_inches).unwrap_or(0.0),
        ),
    }
}

/// Parse a CSS-unit length string (`"1in"`, `"25.4mm"`, `"2.54cm"`,
/// `"96px"`, or a bare number treated as inches) into inches. Unparseable
/// input falls back to `0.0`.
fn parse_css_length_inches(value: &str) -> f64 {
    let trimmed = value.trim();

    let (number_part, unit) = if let Some(stripped) = trimmed.strip_suffix("in") {
        (stripped, "in")
    } else if let Some(stripped) = trimmed.strip_suffix("mm") {
        (stripped, "mm")
    } else if let Some(stripped) = trimmed.strip_suffix("cm") {
        (stripped, "cm")
    } else if let Some(stripped) = trimmed.strip_suffix("px") {
        (stripped, "px")
    } else {
        (trimmed, "in")
    };

    let number: f64 = match number_part.trim().parse() {
        Ok(n) => n,
        Err(_) => return 0.0,
    };

    match unit {
        "mm" => number / 25.4,
        "cm" => number / 2.54,
        "px" => number / 96.0,
        _ => number,
    }
}

fn close_tab_safely(tab: &Tab) {
    if let Err(e) = tab.close(true) {
        log::warn!("Failed to close tab (continuing anyway): {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_length_inches() {
        assert!((parse_css_length_inches("1in") - 1.0).abs() < 1e-9);
        assert!((parse_css_length_inches("25.4mm") - 1.0).abs() < 1e-6);
        assert!((parse_css_length_inches("2.54cm") - 1.0).abs() < 1e-6);
        assert!((parse_css_length_inches("96px") - 1.0).abs() < 1e-6);
        assert_eq!(parse_css_length_inches("not-a-length"), 0.0);
    }

    #[test]
    fn test_margins_in_inches_defaults_to_zero() {
        assert_eq!(margins_in_inches(None), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_margins_in_inches_partial() {
        let margins = Margins {
            top: Some("1in".to_string()),
            bottom: None,
            left: None,
            right: None,
        };
        let (top, bottom, left, right) = margins_in_inches(Some(&margins));
        assert!((top - 1.0).abs() < 1e-9);
        assert_eq!((bottom, left, right), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_build_print_options_explicit_size_overrides_format() {
        let mut options = PdfOptions::default();
        options.width = Some("5in".to_string());
        options.height = Some("7in".to_string());
        let print_options = build_print_options(&options).unwrap();
        assert_eq!(print_options.paper_width, Some(5.0));
        assert_eq!(print_options.paper_height, Some(7.0));
    }

    #[test]
    fn test_build_print_options_header_footer_defaults() {
        let mut options = PdfOptions::default();
        options.header_template = Some("<div>hi</div>".to_string());
        let print_options = build_print_options(&options).unwrap();
        assert_eq!(print_options.display_header_footer, Some(true));
        assert_eq!(print_options.footer_template.as_deref(), Some("<span></span>"));
    }

    #[test]
    fn test_wait_for_network_idle_returns_when_already_idle() {
        let in_flight = AtomicI64::new(0);
        let result = wait_for_network_idle(&in_flight, &CancelSignal::none());
        assert!(result.is_ok());
    }

    #[test]
    fn test_wait_for_network_idle_observes_cancellation() {
        let in_flight = AtomicI64::new(1);
        let cancel = CancelSignal::new();
        cancel.cancel();
        let result = wait_for_network_idle(&in_flight, &cancel);
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }
}
