//! Configuration types for batch HTML-to-bundle conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config across tasks and to see, in one place, why two runs
//! produced different bundles.

use crate::error::BatchError;
use std::path::PathBuf;

/// Configuration for a batch conversion run.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use html2bundle::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .input_dir("reports")
///     .dpi(300)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Directory scanned (non-recursively) for `.html` documents. Default: `html`.
    pub input_dir: PathBuf,

    /// Root directory receiving one bundle subdirectory per document.
    /// Default: `output`. Created on demand; never touched when the input
    /// directory holds no documents.
    pub output_dir: PathBuf,

    /// Browser viewport width in CSS pixels. Range: 320–7680. Default: 1920.
    ///
    /// This is also the PDF page width, so it decides where lines wrap and how
    /// wide tables can grow before they overflow. 1920 matches a full-HD
    /// screen, which is what most report stylesheets are designed against.
    pub viewport_width: u32,

    /// Nominal browser viewport height in CSS pixels while the document loads.
    /// Range: 240–4320. Default: 1080.
    ///
    /// Only affects loading (lazy-load triggers, `vh` units). The PDF page
    /// height comes from the measured content height, never from this value.
    pub viewport_height: u32,

    /// Rasterisation DPI for the per-page PNG images. Range: 72–1200.
    /// Default: 600.
    ///
    /// 600 DPI gives print-quality page images suitable for archival. Drop to
    /// 150–300 when the images feed a screen-only viewer and disk usage
    /// matters more than print fidelity.
    pub dpi: u32,

    /// Maximum number of documents converted concurrently. Default: 4.
    ///
    /// Each in-flight document owns a whole browser process plus a pdfium
    /// rasterisation, so this is a memory knob as much as a speed knob.
    pub concurrency: usize,

    /// File stem of the PDF artifact inside each bundle. Default: `report`.
    pub pdf_stem: String,

    /// Seconds to wait for a loaded page to settle before measuring it.
    /// Minimum: 1. Default: 30.
    pub render_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("html"),
            output_dir: PathBuf::from("output"),
            viewport_width: 1920,
            viewport_height: 1080,
            dpi: 600,
            concurrency: 4,
            pdf_stem: "report".to_string(),
            render_timeout_secs: 30,
        }
    }
}

impl BatchConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }
}

/// Builder for [`BatchConfig`].
///
/// Numeric setters clamp out-of-range values into their documented range
/// instead of failing, so a config assembled from user input is always
/// usable; [`build`](Self::build) only rejects problems clamping cannot fix.
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    /// Set the input directory scanned for documents.
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    /// Set the root directory for output bundles.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the viewport width in CSS pixels (clamped to 320–7680).
    pub fn viewport_width(mut self, px: u32) -> Self {
        self.config.viewport_width = px.clamp(320, 7680);
        self
    }

    /// Set the nominal viewport height in CSS pixels (clamped to 240–4320).
    pub fn viewport_height(mut self, px: u32) -> Self {
        self.config.viewport_height = px.clamp(240, 4320);
        self
    }

    /// Set the rasterisation DPI (clamped to 72–1200).
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 1200);
        self
    }

    /// Set the maximum number of concurrently converted documents (minimum 1).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Set the file stem of the PDF artifact inside each bundle.
    pub fn pdf_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.pdf_stem = stem.into();
        self
    }

    /// Set the page-settle timeout in seconds (minimum 1).
    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    /// Validate and return the final configuration.
    ///
    /// # Errors
    /// Returns [`BatchError::InvalidConfig`] if a path is empty, the PDF stem
    /// is empty or contains a path separator, or a numeric field was set
    /// directly on the struct outside its documented range.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = self.config;
        if c.input_dir.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "input directory must not be empty".to_string(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "output directory must not be empty".to_string(),
            ));
        }
        if c.pdf_stem.is_empty() {
            return Err(BatchError::InvalidConfig(
                "PDF stem must not be empty".to_string(),
            ));
        }
        if c.pdf_stem.contains(['/', '\\']) {
            return Err(BatchError::InvalidConfig(format!(
                "PDF stem must not contain path separators, got '{}'",
                c.pdf_stem
            )));
        }
        if c.dpi < 72 || c.dpi > 1200 {
            return Err(BatchError::InvalidConfig(format!(
                "DPI must be 72–1200, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(BatchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BatchConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("html"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 1080);
        assert_eq!(config.dpi, 600);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.pdf_stem, "report");
        assert_eq!(config.render_timeout_secs, 30);
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let config = BatchConfig::builder()
            .dpi(10_000)
            .viewport_width(100)
            .viewport_height(9_999)
            .concurrency(0)
            .render_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.dpi, 1200);
        assert_eq!(config.viewport_width, 320);
        assert_eq!(config.viewport_height, 4320);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.render_timeout_secs, 1);
    }

    #[test]
    fn build_rejects_empty_pdf_stem() {
        let err = BatchConfig::builder().pdf_stem("").build().unwrap_err();
        assert!(err.to_string().contains("PDF stem"));
    }

    #[test]
    fn build_rejects_pdf_stem_with_separator() {
        let err = BatchConfig::builder()
            .pdf_stem("nested/report")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("path separators"));
    }

    #[test]
    fn build_rejects_empty_input_dir() {
        let err = BatchConfig::builder().input_dir("").build().unwrap_err();
        assert!(err.to_string().contains("input directory"));
    }

    #[test]
    fn builder_accepts_path_and_string_inputs() {
        let config = BatchConfig::builder()
            .input_dir(PathBuf::from("reports"))
            .output_dir("bundles")
            .pdf_stem("rendered")
            .build()
            .unwrap();
        assert_eq!(config.input_dir, PathBuf::from("reports"));
        assert_eq!(config.output_dir, PathBuf::from("bundles"));
        assert_eq!(config.pdf_stem, "rendered");
    }
}
