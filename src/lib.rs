//! # html2bundle
//!
//! Convert batches of standalone HTML documents into per-document archive
//! bundles: a PDF sized to the full content height, one PNG per PDF page,
//! and a verbatim copy of the source file.
//!
//! ## Why this crate?
//!
//! Self-contained HTML is a popular export format (reports, invoices, test
//! dashboards), but it is a poor archival one — it re-renders differently as
//! browsers change. This crate snapshots each document once through a real
//! browser engine and keeps three representations side by side: a vector PDF
//! for fidelity, page images for thumbnailing and diffing, and the original
//! markup for provenance. The hard part is not the engines — Chromium and
//! pdfium do the heavy lifting — but the discipline around them: bounded
//! concurrency, per-document failure isolation, and live progress across
//! documents that finish in any order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! html/*.html
//!  │
//!  ├─ 1. Source   enumerate .html documents (one task each)
//!  ├─ 2. Bundle   create output/<name>/ and derive artifact paths
//!  ├─ 3. Render   headless Chromium prints a content-height PDF (spawn_blocking)
//!  ├─ 4. Raster   pdfium draws page_001.png … page_NNN.png (spawn_blocking)
//!  ├─ 5. Archive  copy the original document into its bundle
//!  └─ 6. Report   per-task state machine outcome + batch summary
//! ```
//!
//! Documents convert concurrently up to a configurable limit; one failed
//! document never aborts its siblings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2bundle::{BatchConfig, BatchConverter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .input_dir("html")
//!         .output_dir("output")
//!         .concurrency(4)
//!         .build()?;
//!     let summary = BatchConverter::new(config).run().await?;
//!     eprintln!(
//!         "{}/{} converted, {} failed",
//!         summary.converted, summary.total_documents, summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2bundle` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! html2bundle = { version = "0.2", default-features = false }
//! ```
//!
//! ## Engine Requirements
//!
//! Rendering needs a Chromium or Chrome binary (auto-discovered, or pointed
//! at via `CHROME`); rasterisation needs a pdfium library (`PDFIUM_LIB_PATH`,
//! the working directory, or a system-wide install). The [`testing`] module
//! ships engine doubles so the test suite and downstream consumers run
//! without either installed.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod task;
pub mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{BatchConverter, TaskReportStream};
pub use config::{BatchConfig, BatchConfigBuilder};
pub use error::{BatchError, RasterizeError, RenderError, TaskError};
pub use pipeline::bundle::{page_image_name, OutputBundle};
pub use pipeline::raster::{PageRasterizer, PdfiumRasterizer};
pub use pipeline::render::{ChromiumRenderer, PageRenderer, RenderOutcome};
pub use pipeline::source::{enumerate_documents, Document};
pub use progress::{
    NoopProgressReporter, ProgressReporter, ProgressUpdate, SharedReporter, TaskHandle,
};
pub use report::{BatchSummary, FailedStage, TaskFailure, TaskReport, TaskState};
pub use task::ConversionTask;
