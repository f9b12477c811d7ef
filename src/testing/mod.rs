//! Test doubles for the conversion engines and progress reporting.
//!
//! The real engines need a Chromium binary and a pdfium library on the
//! machine. The doubles here run the full pipeline — enumeration, bundle
//! layout, task supervision, scheduling, progress — against plain files, so
//! the default test suite passes on a bare checkout. They are exported
//! rather than `cfg(test)`-gated so integration tests and downstream crates
//! can drive the pipeline without either engine installed.
//!
//! [`MockRenderer`] writes a small fake artifact whose page count
//! [`MockRasterizer`] parses back out, mirroring how the real engines hand
//! off through the artifact file alone.

mod mock_raster;
mod mock_render;
mod recording;

pub use mock_raster::MockRasterizer;
pub use mock_render::MockRenderer;
pub use recording::{ProgressEvent, RecordingReporter};
