//! Progress-reporting trait for per-task conversion events.
//!
//! Attach an [`Arc<dyn ProgressReporter>`] via
//! [`crate::BatchConverter::with_reporter`] to receive real-time events as
//! documents move through the pipeline.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a broadcast channel, or a job
//! database without the library knowing how the host application
//! communicates. The trait is `Send + Sync` because tasks report from
//! concurrently running futures.
//!
//! # Example
//!
//! ```rust
//! use html2bundle::{ProgressReporter, ProgressUpdate, TaskHandle};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct CountingReporter {
//!     completed: AtomicUsize,
//! }
//!
//! impl ProgressReporter for CountingReporter {
//!     fn on_task_complete(&self, task: TaskHandle, page_count: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("task {} done ({} pages), {} finished so far", task.0, page_count, done);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Identifies one conversion task within a batch.
///
/// The wrapped index is assigned in enumeration order and stays stable for
/// the lifetime of the batch, so reporters can key per-task display state
/// (progress bars, timers) on it even though tasks finish in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub usize);

/// A single progress change for one task.
///
/// Percentages are clamped to 0–100 by the task that applies them; a task's
/// recorded progress never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Move forward by this many percentage points.
    Advance(u8),
    /// Jump to this absolute percentage.
    Set(u8),
}

/// Called by the batch pipeline as documents move through their stages.
///
/// All methods have no-op default implementations, so implementors override
/// only the events they care about. Invoked from concurrently running tasks;
/// implementations should return quickly and must not block.
pub trait ProgressReporter: Send + Sync {
    /// A batch run is starting.
    ///
    /// # Arguments
    /// * `total_documents` - Number of documents that will be converted
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// A document's conversion task has been admitted and started rendering.
    ///
    /// # Arguments
    /// * `task` - Stable handle for this task
    /// * `document` - Document name (file stem)
    fn on_task_start(&self, task: TaskHandle, document: &str) {
        let _ = (task, document);
    }

    /// A task made progress.
    ///
    /// # Arguments
    /// * `task` - Stable handle for this task
    /// * `update` - Relative or absolute percentage change
    /// * `description` - Human-readable account of what just happened
    fn on_update(&self, task: TaskHandle, update: ProgressUpdate, description: &str) {
        let _ = (task, update, description);
    }

    /// A task finished successfully. No further events follow for it.
    ///
    /// # Arguments
    /// * `task` - Stable handle for this task
    /// * `page_count` - Number of page images in the finished bundle
    fn on_task_complete(&self, task: TaskHandle, page_count: usize) {
        let _ = (task, page_count);
    }

    /// A task failed. No further events follow for it.
    ///
    /// # Arguments
    /// * `task` - Stable handle for this task
    /// * `error` - Rendered description of the failure
    fn on_task_failed(&self, task: TaskHandle, error: &str) {
        let _ = (task, error);
    }

    /// The batch finished; every task reached a terminal state.
    ///
    /// # Arguments
    /// * `converted` - Number of successfully converted documents
    /// * `failed` - Number of failed documents
    fn on_batch_complete(&self, converted: usize, failed: usize) {
        let _ = (converted, failed);
    }
}

/// A reporter that ignores all events. Used when no reporter is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {}

/// Shared, thread-safe reporter handle passed into running tasks.
pub type SharedReporter = Arc<dyn ProgressReporter>;
