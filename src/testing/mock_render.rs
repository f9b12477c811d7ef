//! Mock renderer for tests.

use crate::config::BatchConfig;
use crate::error::RenderError;
use crate::pipeline::render::{PageRenderer, RenderOutcome};
use crate::pipeline::source::Document;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Nominal CSS-pixel height of one fake page.
const FAKE_PAGE_HEIGHT_PX: u32 = 1080;

/// Serialise a fake artifact carrying `pages`.
pub(crate) fn fake_artifact(pages: usize) -> String {
    format!("%FAKE-PDF\npages={pages}\n")
}

/// Parse the page count back out of a fake artifact.
pub(crate) fn parse_fake_artifact(text: &str) -> Option<usize> {
    if !text.starts_with("%FAKE-PDF") {
        return None;
    }
    text.lines()
        .find_map(|line| line.strip_prefix("pages="))
        .and_then(|count| count.trim().parse().ok())
}

/// A [`PageRenderer`] that writes a fake artifact instead of driving a
/// browser.
///
/// Failures, page counts and an artificial render duration are injectable
/// per document; the mock additionally tracks how many renders overlapped,
/// which is what concurrency-limit tests assert on.
#[derive(Debug, Default)]
pub struct MockRenderer {
    default_pages: AtomicUsize,
    page_overrides: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    rendered: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRenderer {
    /// A renderer producing one-page artifacts instantly.
    pub fn new() -> Self {
        Self {
            default_pages: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    /// Page count written for documents without an override.
    pub fn set_default_pages(&self, pages: usize) {
        self.default_pages.store(pages, Ordering::SeqCst);
    }

    /// Page count written for one specific document.
    pub fn set_pages(&self, document: &str, pages: usize) {
        self.page_overrides
            .lock()
            .unwrap()
            .insert(document.to_string(), pages);
    }

    /// Make rendering this document fail.
    pub fn fail_document(&self, document: &str) {
        self.failures.lock().unwrap().insert(document.to_string());
    }

    /// Sleep this long inside every render, to force renders to overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Names of successfully rendered documents, in completion order.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    /// Highest number of renders that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(
        &self,
        document: &Document,
        destination: &Path,
        _config: &BatchConfig,
    ) -> Result<RenderOutcome, RenderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = if self.failures.lock().unwrap().contains(&document.name) {
            Err(RenderError::Navigation {
                path: document.path.clone(),
                detail: "injected render failure".to_string(),
            })
        } else {
            let pages = self
                .page_overrides
                .lock()
                .unwrap()
                .get(&document.name)
                .copied()
                .unwrap_or_else(|| self.default_pages.load(Ordering::SeqCst));
            match tokio::fs::write(destination, fake_artifact(pages)).await {
                Ok(()) => {
                    self.rendered.lock().unwrap().push(document.name.clone());
                    Ok(RenderOutcome {
                        content_height_px: (pages.max(1) as u32) * FAKE_PAGE_HEIGHT_PX,
                    })
                }
                Err(source) => Err(RenderError::PdfWrite {
                    path: destination.to_path_buf(),
                    source,
                }),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
