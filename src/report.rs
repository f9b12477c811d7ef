//! Result types returned by batch runs.
//!
//! [`TaskReport`] is the per-document record (state machine outcome, bundle
//! contents, timing, failure details); [`BatchSummary`] aggregates the whole
//! run. Both serialise to JSON unchanged, which is what the CLI prints under
//! `--json`.

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle of one conversion task.
///
/// Stages are strictly sequential: `Pending → Rendering → Rasterizing →
/// Archiving → Complete`. Any non-terminal state may transition to `Failed`.
/// `Complete` and `Failed` are terminal; a finished task never changes state
/// or progress again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Enumerated, waiting for a concurrency slot.
    Pending,
    /// Printing the document to a content-height PDF.
    Rendering,
    /// Drawing one PNG per PDF page.
    Rasterizing,
    /// Copying the original document into the bundle.
    Archiving,
    /// Every artifact produced.
    Complete,
    /// A stage failed; the error is recorded in the report.
    Failed,
}

impl TaskState {
    /// Whether the task has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Failed)
    }

    /// Whether the task currently occupies a concurrency slot.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TaskState::Rendering | TaskState::Rasterizing | TaskState::Archiving
        )
    }
}

/// The pipeline stage a failed task was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Render,
    Rasterize,
    Archive,
    Io,
}

/// Serialisable record of one task failure.
///
/// Carries the failed stage for programmatic matching plus the rendered
/// error chain for humans. The full typed error is [`TaskError`]; it is
/// flattened here so reports stay `Clone + Serialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Which stage failed.
    pub stage: FailedStage,
    /// Rendered error message, including the source chain.
    pub message: String,
}

impl From<&TaskError> for TaskFailure {
    fn from(error: &TaskError) -> Self {
        let stage = match error {
            TaskError::Render { .. } => FailedStage::Render,
            TaskError::Rasterize { .. } => FailedStage::Rasterize,
            TaskError::Archive { .. } => FailedStage::Archive,
            TaskError::Io { .. } => FailedStage::Io,
        };
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

/// Final record of one document's conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    /// Position of the document in enumeration order.
    pub index: usize,
    /// Document name (file stem), which is also the bundle directory name.
    pub document: String,
    /// Path of the source document.
    pub source_path: PathBuf,
    /// Terminal state: [`TaskState::Complete`] or [`TaskState::Failed`].
    pub state: TaskState,
    /// Final progress percentage; exactly 100 for a completed task.
    pub progress_percent: u8,
    /// Last status description recorded for the task.
    pub last_description: String,
    /// Number of page images produced. Zero if the task failed before
    /// rasterisation finished.
    pub page_count: usize,
    /// Paths of the page images, ordered by page number.
    pub page_paths: Vec<PathBuf>,
    /// Bundle directory, if the task got far enough to populate one.
    pub bundle_dir: Option<PathBuf>,
    /// Wall-clock duration of the task.
    pub duration_ms: u64,
    /// Failure details; `Some` exactly when `state` is [`TaskState::Failed`].
    pub error: Option<TaskFailure>,
}

impl TaskReport {
    /// Whether the task produced a complete bundle.
    pub fn is_complete(&self) -> bool {
        self.state == TaskState::Complete
    }

    /// Whether the task failed.
    pub fn is_failed(&self) -> bool {
        self.state == TaskState::Failed
    }
}

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of documents enumerated.
    pub total_documents: usize,
    /// Number of documents that produced a complete bundle.
    pub converted: usize,
    /// Number of documents that failed.
    pub failed: usize,
    /// Wall-clock duration of the whole batch.
    pub duration_ms: u64,
    /// Per-document reports in enumeration order.
    pub reports: Vec<TaskReport>,
}

impl BatchSummary {
    /// Summary of a run that found nothing to convert.
    pub fn empty() -> Self {
        Self {
            total_documents: 0,
            converted: 0,
            failed: 0,
            duration_ms: 0,
            reports: Vec::new(),
        }
    }

    /// Aggregate a set of task reports into a summary.
    pub fn from_reports(reports: Vec<TaskReport>, duration_ms: u64) -> Self {
        let converted = reports.iter().filter(|r| r.is_complete()).count();
        let failed = reports.iter().filter(|r| r.is_failed()).count();
        Self {
            total_documents: reports.len(),
            converted,
            failed,
            duration_ms,
            reports,
        }
    }

    /// Whether any document failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
