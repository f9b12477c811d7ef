//! Markup rendering: print a document to a content-height PDF via headless
//! Chromium.
//!
//! ## Why spawn_blocking?
//!
//! The `headless_chrome` crate drives the Chrome DevTools Protocol over a
//! synchronous websocket; every call blocks its thread. `tokio::task::
//! spawn_blocking` moves the whole browser session onto the blocking thread
//! pool so Tokio worker threads never stall while a page loads.
//!
//! ## Why a browser per document?
//!
//! Each render launches a fresh browser and drops it on return, success or
//! failure. Chromium kills its child process on drop, so a crashed or hung
//! page can never leak a process into later documents, and documents cannot
//! observe each other through shared browser state.
//!
//! ## Why one PDF page?
//!
//! The page height is set to the document's measured `scrollHeight`, so the
//! whole document lands on a single continuous PDF page with no arbitrary
//! breaks mid-table or mid-figure. Pagination happens later, at
//! rasterisation time, where pdfium splits on real page boundaries.

use crate::config::BatchConfig;
use crate::error::RenderError;
use crate::pipeline::source::Document;
use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// CSS reference pixels per inch; CDP print dimensions are in inches.
const CSS_PX_PER_INCH: f64 = 96.0;

/// Poll interval while waiting for a loaded page to settle.
const SETTLE_POLL: Duration = Duration::from_millis(50);

/// Outcome of rendering one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Measured `scrollHeight` of the document body, in CSS pixels. This is
    /// the height the PDF page was printed at.
    pub content_height_px: u32,
}

/// Markup-to-PDF rendering engine.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `document` into a PDF at `destination`.
    ///
    /// The engine must wait for the page to finish loading and settle before
    /// measuring it, honour background graphics and CSS-declared page sizes,
    /// and release all browser resources before returning — on the error
    /// path too.
    async fn render(
        &self,
        document: &Document,
        destination: &Path,
        config: &BatchConfig,
    ) -> Result<RenderOutcome, RenderError>;
}

/// Production renderer driving headless Chromium through the DevTools
/// protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumRenderer;

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(
        &self,
        document: &Document,
        destination: &Path,
        config: &BatchConfig,
    ) -> Result<RenderOutcome, RenderError> {
        let document = document.clone();
        let destination = destination.to_path_buf();
        let viewport_width = config.viewport_width;
        let viewport_height = config.viewport_height;
        let timeout_secs = config.render_timeout_secs;

        tokio::task::spawn_blocking(move || {
            render_blocking(
                &document,
                &destination,
                viewport_width,
                viewport_height,
                timeout_secs,
            )
        })
        .await
        .map_err(|e| RenderError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Blocking implementation of one browser session.
fn render_blocking(
    document: &Document,
    destination: &Path,
    viewport_width: u32,
    viewport_height: u32,
    timeout_secs: u64,
) -> Result<RenderOutcome, RenderError> {
    let url = file_url(&document.path)?;

    let options = LaunchOptions::default_builder()
        .headless(true)
        .window_size(Some((viewport_width, viewport_height)))
        .build()
        .map_err(|e| RenderError::BrowserLaunch {
            detail: e.to_string(),
        })?;
    let browser = Browser::new(options).map_err(|e| RenderError::BrowserLaunch {
        detail: e.to_string(),
    })?;
    // The browser child process dies when `browser` drops, on every return
    // path below.
    let tab = browser.new_tab().map_err(|e| RenderError::BrowserLaunch {
        detail: e.to_string(),
    })?;
    tab.set_default_timeout(Duration::from_secs(timeout_secs));

    tab.navigate_to(url.as_str())
        .map_err(|e| RenderError::Navigation {
            path: document.path.clone(),
            detail: e.to_string(),
        })?;
    tab.wait_until_navigated()
        .map_err(|e| RenderError::Navigation {
            path: document.path.clone(),
            detail: e.to_string(),
        })?;
    wait_until_settled(&tab, document, timeout_secs)?;

    let content_height_px = measure_content_height(&tab, document)?;
    info!(
        "Measured '{}' at {} px content height",
        document.name, content_height_px
    );

    let (paper_width, paper_height) = page_size_inches(viewport_width, content_height_px);
    let pdf = tab
        .print_to_pdf(Some(PrintToPdfOptions {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            ..Default::default()
        }))
        .map_err(|e| RenderError::PdfGeneration {
            path: document.path.clone(),
            detail: e.to_string(),
        })?;

    std::fs::write(destination, &pdf).map_err(|source| RenderError::PdfWrite {
        path: destination.to_path_buf(),
        source,
    })?;
    debug!(
        "Wrote {} PDF bytes to '{}'",
        pdf.len(),
        destination.display()
    );

    Ok(RenderOutcome { content_height_px })
}

/// Wait until the document has finished loading and its layout has settled.
///
/// The CDP driver exposes no network-idle event, so settling is approximated
/// observably: `readyState` must reach `"complete"` (every subresource
/// fetched) and the content height must hold steady across two consecutive
/// polls, which catches late layout shifts from fonts and lazy images before
/// the height is measured for real.
fn wait_until_settled(tab: &Tab, document: &Document, timeout_secs: u64) -> Result<(), RenderError> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        let complete = tab
            .evaluate("document.readyState", false)
            .ok()
            .and_then(|result| result.value)
            .map(|value| value == "complete")
            .unwrap_or(false);
        if complete {
            let before = measure_content_height(tab, document).ok();
            std::thread::sleep(SETTLE_POLL);
            let after = measure_content_height(tab, document).ok();
            // Both-None falls through too: the real measurement below the
            // wait raises the proper error instead of a timeout.
            if before == after {
                return Ok(());
            }
        } else {
            std::thread::sleep(SETTLE_POLL);
        }
        if Instant::now() >= deadline {
            return Err(RenderError::ReadinessTimeout {
                path: document.path.clone(),
                secs: timeout_secs,
            });
        }
    }
}

/// Evaluate `document.body.scrollHeight` and return it as whole pixels.
fn measure_content_height(tab: &Tab, document: &Document) -> Result<u32, RenderError> {
    let result = tab
        .evaluate("document.body.scrollHeight", false)
        .map_err(|e| RenderError::Measurement {
            path: document.path.clone(),
            detail: e.to_string(),
        })?;
    let value: Option<serde_json::Value> = result.value;
    let height = value
        .as_ref()
        .and_then(|v| v.as_f64())
        .ok_or_else(|| RenderError::Measurement {
            path: document.path.clone(),
            detail: format!("scrollHeight returned a non-numeric value: {:?}", value),
        })?;
    // A present-but-empty body still prints; floor at one pixel.
    Ok(height.ceil().max(1.0) as u32)
}

/// Build the `file://` navigation URL for a local document.
fn file_url(path: &Path) -> Result<Url, RenderError> {
    let absolute = std::fs::canonicalize(path).map_err(|e| RenderError::Navigation {
        path: path.to_path_buf(),
        detail: format!("cannot resolve path: {}", e),
    })?;
    Url::from_file_path(&absolute).map_err(|_| RenderError::Navigation {
        path: path.to_path_buf(),
        detail: "path is not representable as a file:// URL".to_string(),
    })
}

/// Convert a CSS-pixel page size into the inches CDP expects.
fn page_size_inches(width_px: u32, height_px: u32) -> (f64, f64) {
    (
        width_px as f64 / CSS_PX_PER_INCH,
        height_px as f64 / CSS_PX_PER_INCH,
    )
}
