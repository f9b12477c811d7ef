//! Pipeline stages for HTML-to-bundle conversion.
//!
//! Each submodule implements exactly one concern. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (e.g. a different rendering engine) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ bundle ──▶ render ──▶ raster ──▶ archive
//! (scan)     (layout)  (chromium)  (pdfium)   (copy)
//! ```
//!
//! 1. [`source`] — enumerate the input directory into documents, one task each
//! 2. [`bundle`] — create the per-document output directory and name every
//!    artifact in it
//! 3. [`render`] — print the document to a content-height PDF via headless
//!    Chromium; runs in `spawn_blocking` because the CDP driver is synchronous
//! 4. [`raster`] — draw one PNG per PDF page via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//!
//! The archive step is a plain copy owned by [`bundle`]; stage sequencing and
//! failure capture live in [`crate::task`].

pub mod bundle;
pub mod raster;
pub mod render;
pub mod source;
