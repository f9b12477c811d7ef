//! Batch scheduling: fan documents out with bounded concurrency.
//!
//! ## Why buffer_unordered?
//!
//! The scheduler admits at most `concurrency` tasks at a time and lets each
//! completion free a slot for the next waiting document, with no ordering
//! between documents. `futures::stream::buffer_unordered` is exactly that
//! discipline without a hand-rolled semaphore. Because a task resolves to a
//! [`TaskReport`] whether it succeeded or failed, a failed document releases
//! its slot the same way a successful one does, and the batch future
//! resolves only after every task reached a terminal state.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::pipeline::raster::{PageRasterizer, PdfiumRasterizer};
use crate::pipeline::render::{ChromiumRenderer, PageRenderer};
use crate::pipeline::source::{enumerate_documents, Document};
use crate::progress::{NoopProgressReporter, SharedReporter};
use crate::report::{BatchSummary, TaskReport};
use crate::task::run_task;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::info;

/// Boxed stream of task reports in completion order.
pub type TaskReportStream = Pin<Box<dyn Stream<Item = TaskReport> + Send>>;

/// Converts a directory of HTML documents into per-document bundles.
///
/// [`BatchConverter::new`] wires up the production engines (headless
/// Chromium and pdfium); [`BatchConverter::with_engines`] accepts any
/// [`PageRenderer`]/[`PageRasterizer`] pair, which is how the test suite
/// runs the full pipeline without a browser installed.
pub struct BatchConverter {
    config: BatchConfig,
    renderer: Arc<dyn PageRenderer>,
    rasterizer: Arc<dyn PageRasterizer>,
    reporter: SharedReporter,
}

impl BatchConverter {
    /// A converter using the production engines.
    pub fn new(config: BatchConfig) -> Self {
        Self::with_engines(
            config,
            Arc::new(ChromiumRenderer::new()),
            Arc::new(PdfiumRasterizer::new()),
        )
    }

    /// A converter using caller-supplied engines.
    pub fn with_engines(
        config: BatchConfig,
        renderer: Arc<dyn PageRenderer>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            config,
            renderer,
            rasterizer,
            reporter: Arc::new(NoopProgressReporter),
        }
    }

    /// Attach a progress reporter receiving batch and per-task events.
    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Enumerate the input directory and convert everything in it.
    ///
    /// An empty input directory yields [`BatchSummary::empty`] without
    /// touching the output directory. Per-document failures never surface
    /// here; they are recorded in the summary's reports.
    ///
    /// # Errors
    /// Only enumeration-level problems: the input directory is missing or
    /// unreadable.
    pub async fn run(&self) -> Result<BatchSummary, BatchError> {
        let documents = enumerate_documents(&self.config.input_dir)?;
        if documents.is_empty() {
            info!(
                "No documents found in '{}', nothing to convert",
                self.config.input_dir.display()
            );
            return Ok(BatchSummary::empty());
        }
        Ok(self.run_documents(documents).await)
    }

    /// Convert an explicit list of documents.
    pub async fn run_documents(&self, documents: Vec<Document>) -> BatchSummary {
        let start = Instant::now();
        info!(
            "Starting batch: {} documents, concurrency {}",
            documents.len(),
            self.config.concurrency
        );
        self.reporter.on_batch_start(documents.len());

        let mut reports: Vec<TaskReport> = stream::iter(documents.into_iter().enumerate().map(
            |(index, document)| {
                let renderer = Arc::clone(&self.renderer);
                let rasterizer = Arc::clone(&self.rasterizer);
                let reporter = Arc::clone(&self.reporter);
                let config = &self.config;
                async move { run_task(index, document, config, renderer, rasterizer, reporter).await }
            },
        ))
        .buffer_unordered(self.config.concurrency)
        .collect()
        .await;

        // Completion order is arbitrary; restore enumeration order so
        // summaries are stable across runs.
        reports.sort_by_key(|report| report.index);

        let summary = BatchSummary::from_reports(reports, start.elapsed().as_millis() as u64);
        self.reporter
            .on_batch_complete(summary.converted, summary.failed);
        info!(
            "Batch finished: {}/{} converted, {} failed, {}ms",
            summary.converted, summary.total_documents, summary.failed, summary.duration_ms
        );
        summary
    }

    /// Convert documents and yield each report as its task finishes.
    ///
    /// Reports arrive in completion order, not enumeration order. Per-task
    /// reporter events still fire; the batch-level `on_batch_start`/
    /// `on_batch_complete` events do not, since the consumer drives the
    /// stream and knows both edges itself. Aggregate the collected reports
    /// with [`BatchSummary::from_reports`] if a summary is needed.
    pub fn run_stream(&self, documents: Vec<Document>) -> TaskReportStream {
        let concurrency = self.config.concurrency;
        let tasks: Vec<_> = documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| {
                let renderer = Arc::clone(&self.renderer);
                let rasterizer = Arc::clone(&self.rasterizer);
                let reporter = Arc::clone(&self.reporter);
                let config = self.config.clone();
                async move {
                    run_task(index, document, &config, renderer, rasterizer, reporter).await
                }
            })
            .collect();

        Box::pin(stream::iter(tasks).buffer_unordered(concurrency))
    }
}

impl fmt::Debug for BatchConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConverter")
            .field("config", &self.config)
            .field("renderer", &"<dyn PageRenderer>")
            .field("rasterizer", &"<dyn PageRasterizer>")
            .finish()
    }
}
