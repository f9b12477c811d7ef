//! Error types for the html2bundle library.
//!
//! Two levels reflect two failure modes:
//!
//! * [`BatchError`] — **Fatal**: the batch cannot start at all (input
//!   directory missing or unreadable, invalid configuration). Returned as
//!   `Err` from [`crate::BatchConverter::run`].
//!
//! * [`TaskError`] — **Non-fatal**: a single document failed and every other
//!   document in the batch is unaffected. Caught at the task boundary and
//!   recorded inside [`crate::TaskReport`], so callers get partial success
//!   instead of losing a whole batch to one bad input.
//!
//! The stage errors [`RenderError`] and [`RasterizeError`] are produced by
//! the conversion engines; the task supervisor wraps them into [`TaskError`]
//! together with the document they belong to.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that prevent a batch from starting.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input directory does not exist.
    #[error(
        "Input directory not found: '{path}'\n\
         Check the path exists, or pass a different directory."
    )]
    InputDirNotFound { path: PathBuf },

    /// The input directory exists but could not be scanned.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the markup-to-PDF rendering engine.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No browser could be launched.
    #[error(
        "Failed to launch a headless browser: {detail}\n\
         Install Chromium or Chrome, or point the CHROME environment variable at the binary."
    )]
    BrowserLaunch { detail: String },

    /// Navigating to the document failed.
    #[error("Navigation to '{path}' failed: {detail}")]
    Navigation { path: PathBuf, detail: String },

    /// The page never settled within the readiness timeout.
    #[error("Timed out after {secs}s waiting for '{path}' to finish loading")]
    ReadinessTimeout { path: PathBuf, secs: u64 },

    /// The content-height probe failed or returned a non-numeric value.
    #[error("Failed to measure the content height of '{path}': {detail}")]
    Measurement { path: PathBuf, detail: String },

    /// The browser failed to produce the PDF.
    #[error("PDF generation for '{path}' failed: {detail}")]
    PdfGeneration { path: PathBuf, detail: String },

    /// The PDF bytes could not be written into the bundle.
    #[error("Failed to write PDF to '{path}': {source}")]
    PdfWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error, e.g. a panicked worker thread.
    #[error("Internal render error: {0}")]
    Internal(String),
}

/// Errors from the PDF-to-image rasterisation engine.
#[derive(Debug, Error)]
pub enum RasterizeError {
    /// The paginated artifact was never produced.
    #[error("Paginated artifact not found: '{path}'")]
    ArtifactMissing { path: PathBuf },

    /// The paginated artifact exists but could not be opened.
    #[error("Failed to open paginated artifact '{path}': {detail}")]
    ArtifactUnreadable { path: PathBuf, detail: String },

    /// The paginated artifact contains zero pages.
    #[error("Paginated artifact '{path}' has no pages")]
    EmptyArtifact { path: PathBuf },

    /// One page could not be drawn.
    #[error("Rasterising page {page} failed: {detail}")]
    PageRender { page: usize, detail: String },

    /// A finished page image could not be written.
    #[error("Failed to write page image '{path}': {detail}")]
    ImageWrite { path: PathBuf, detail: String },

    /// No pdfium library could be bound.
    #[error(
        "Failed to bind a pdfium library: {detail}\n\
         Set PDFIUM_LIB_PATH to the directory containing libpdfium, place the library next to \
         the executable, or install it system-wide."
    )]
    EngineUnavailable { detail: String },

    /// Unexpected internal error, e.g. a panicked worker thread.
    #[error("Internal rasterisation error: {0}")]
    Internal(String),
}

/// A per-document failure, caught at the task boundary.
///
/// Each variant names the stage that failed and the document it belonged to.
/// The batch layer records a `TaskError` and moves on; it never aborts
/// sibling documents.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Rendering the document to a PDF failed.
    #[error("Rendering '{document}' failed: {source}")]
    Render {
        document: String,
        #[source]
        source: RenderError,
    },

    /// Rasterising the PDF into page images failed.
    #[error("Rasterising '{document}' failed: {source}")]
    Rasterize {
        document: String,
        #[source]
        source: RasterizeError,
    },

    /// Copying the original document into the bundle failed.
    #[error("Archiving the source of '{document}' to '{path}' failed: {source}")]
    Archive {
        document: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem work outside the engines failed, e.g. creating the bundle
    /// directory.
    #[error("Preparing the output bundle for '{document}' at '{path}' failed: {source}")]
    Io {
        document: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    /// The document this failure belongs to.
    pub fn document(&self) -> &str {
        match self {
            TaskError::Render { document, .. }
            | TaskError::Rasterize { document, .. }
            | TaskError::Archive { document, .. }
            | TaskError::Io { document, .. } => document,
        }
    }
}
