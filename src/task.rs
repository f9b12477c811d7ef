//! Task supervision: drive one document through render → rasterise → archive.
//!
//! Every document gets exactly one [`ConversionTask`]. The supervisor owns
//! the task's state machine, catches every stage error at the task boundary,
//! and translates stage completions into progress updates. A failed task
//! never affects its siblings; the batch layer treats success and failure
//! alike when releasing concurrency slots.
//!
//! ```text
//! Pending ──▶ Rendering ──▶ Rasterizing ──▶ Archiving ──▶ Complete
//!                 │              │               │
//!                 └──────────────┴───────────────┴───────▶ Failed
//! ```
//!
//! `Complete` and `Failed` are terminal: once either is reached, the task's
//! state, progress and description never change again and no further
//! reporter events are emitted for it.

use crate::config::BatchConfig;
use crate::error::TaskError;
use crate::pipeline::bundle::OutputBundle;
use crate::pipeline::raster::PageRasterizer;
use crate::pipeline::render::PageRenderer;
use crate::pipeline::source::Document;
use crate::progress::{ProgressUpdate, SharedReporter, TaskHandle};
use crate::report::{TaskFailure, TaskReport, TaskState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Progress share granted as each stage completes. The final `Set(100)`
/// absorbs rounding, so the contract callers may rely on is only
/// "monotonic, ending at exactly 100".
const RENDER_SHARE: u8 = 33;
const RASTER_SHARE: u8 = 33;
const ARCHIVE_SHARE: u8 = 34;

/// One document's conversion, tracked through its lifecycle.
#[derive(Debug)]
pub struct ConversionTask {
    document: Document,
    state: TaskState,
    progress_percent: u8,
    last_description: String,
    bundle: Option<OutputBundle>,
    error: Option<TaskFailure>,
}

impl ConversionTask {
    /// A fresh task in [`TaskState::Pending`].
    pub fn new(document: Document) -> Self {
        Self {
            document,
            state: TaskState::Pending,
            progress_percent: 0,
            last_description: "waiting".to_string(),
            bundle: None,
            error: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn last_description(&self) -> &str {
        &self.last_description
    }

    pub fn error(&self) -> Option<&TaskFailure> {
        self.error.as_ref()
    }

    /// Pages rasterised so far. Zero until the rasterise stage completes.
    pub fn page_count(&self) -> usize {
        self.bundle
            .as_ref()
            .map_or(0, |bundle| bundle.page_paths.len())
    }

    /// Enter the next stage. Terminal states are never left.
    fn transition(&mut self, next: TaskState) {
        if self.state.is_terminal() {
            return;
        }
        self.state = next;
    }

    /// Apply a progress update. Progress is clamped to 100 and never
    /// decreases; terminal tasks ignore updates entirely.
    fn apply(&mut self, update: ProgressUpdate, description: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.progress_percent = match update {
            ProgressUpdate::Advance(points) => {
                self.progress_percent.saturating_add(points).min(100)
            }
            ProgressUpdate::Set(percent) => percent.min(100).max(self.progress_percent),
        };
        self.last_description = description.to_string();
    }

    /// Record a failure and enter the terminal [`TaskState::Failed`] state.
    fn fail(&mut self, error: &TaskError) {
        if self.state.is_terminal() {
            return;
        }
        self.last_description = error.to_string();
        self.error = Some(TaskFailure::from(error));
        self.state = TaskState::Failed;
    }

    /// Consume the task into its final report. The bundle travels with the
    /// task, so a failure after rasterisation still reports the directory
    /// and pages it produced.
    fn into_report(self, index: usize, elapsed: Duration) -> TaskReport {
        let (page_paths, bundle_dir) = match self.bundle {
            Some(bundle) => (bundle.page_paths, Some(bundle.directory_path)),
            None => (Vec::new(), None),
        };
        TaskReport {
            index,
            document: self.document.name,
            source_path: self.document.path,
            state: self.state,
            progress_percent: self.progress_percent,
            last_description: self.last_description,
            page_count: page_paths.len(),
            page_paths,
            bundle_dir,
            duration_ms: elapsed.as_millis() as u64,
            error: self.error,
        }
    }
}

/// Apply an update to the task and forward it to the reporter in one step,
/// so recorded state and observed events cannot drift apart.
fn progress(
    task: &mut ConversionTask,
    reporter: &SharedReporter,
    handle: TaskHandle,
    update: ProgressUpdate,
    description: &str,
) {
    task.apply(update, description);
    reporter.on_update(handle, update, description);
}

/// Run one document to a terminal state. Never returns an error: every
/// failure is captured in the returned report.
pub(crate) async fn run_task(
    index: usize,
    document: Document,
    config: &BatchConfig,
    renderer: Arc<dyn PageRenderer>,
    rasterizer: Arc<dyn PageRasterizer>,
    reporter: SharedReporter,
) -> TaskReport {
    let start = Instant::now();
    let handle = TaskHandle(index);
    let mut task = ConversionTask::new(document);
    reporter.on_task_start(handle, &task.document().name);

    match convert_document(&mut task, handle, config, &renderer, &rasterizer, &reporter).await {
        Ok(()) => {
            progress(&mut task, &reporter, handle, ProgressUpdate::Set(100), "complete");
            task.transition(TaskState::Complete);
            reporter.on_task_complete(handle, task.page_count());
            info!(
                "Converted '{}' ({} pages) in {}ms",
                task.document().name,
                task.page_count(),
                start.elapsed().as_millis()
            );
        }
        Err(error) => {
            warn!("Conversion failed: {}", error);
            task.fail(&error);
            reporter.on_task_failed(handle, &error.to_string());
        }
    }
    task.into_report(index, start.elapsed())
}

/// The fallible middle of a task: bundle preparation and the three pipeline
/// stages. The prepared bundle is attached to the task immediately, so the
/// first stage error aborts the remainder without losing what earlier
/// stages already put in it.
async fn convert_document(
    task: &mut ConversionTask,
    handle: TaskHandle,
    config: &BatchConfig,
    renderer: &Arc<dyn PageRenderer>,
    rasterizer: &Arc<dyn PageRasterizer>,
    reporter: &SharedReporter,
) -> Result<(), TaskError> {
    let document = task.document().clone();

    task.transition(TaskState::Rendering);
    let bundle = OutputBundle::prepare(&config.output_dir, &document, &config.pdf_stem)
        .await
        .map_err(|source| TaskError::Io {
            document: document.name.clone(),
            path: config.output_dir.join(&document.name),
            source,
        })?;
    let pdf_path = bundle.pdf_path.clone();
    let bundle_dir = bundle.directory_path.clone();
    task.bundle = Some(bundle);

    let outcome = renderer
        .render(&document, &pdf_path, config)
        .await
        .map_err(|source| TaskError::Render {
            document: document.name.clone(),
            source,
        })?;
    progress(
        task,
        reporter,
        handle,
        ProgressUpdate::Advance(RENDER_SHARE),
        &format!("rendered PDF ({} px tall)", outcome.content_height_px),
    );

    task.transition(TaskState::Rasterizing);
    let page_paths = rasterizer
        .rasterize(&pdf_path, &bundle_dir, config)
        .await
        .map_err(|source| TaskError::Rasterize {
            document: document.name.clone(),
            source,
        })?;
    let description = format!("rasterised {} pages", page_paths.len());
    if let Some(bundle) = task.bundle.as_mut() {
        bundle.page_paths = page_paths;
    }
    progress(
        task,
        reporter,
        handle,
        ProgressUpdate::Advance(RASTER_SHARE),
        &description,
    );

    task.transition(TaskState::Archiving);
    if let Some(bundle) = task.bundle.as_ref() {
        bundle
            .archive_source()
            .await
            .map_err(|source| TaskError::Archive {
                document: document.name.clone(),
                path: bundle.copied_source_path.clone(),
                source,
            })?;
    }
    progress(
        task,
        reporter,
        handle,
        ProgressUpdate::Advance(ARCHIVE_SHARE),
        "archived source",
    );

    Ok(())
}
