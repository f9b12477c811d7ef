//! PDF rasterisation: draw every page of the paginated artifact as a PNG via
//! pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the CPU-heavy page drawing
//! onto the blocking thread pool, so sibling documents keep rendering while
//! one rasterises.
//!
//! ## Why scale by DPI?
//!
//! The artifact's single PDF page already has the document's true physical
//! size, so a plain `dpi / 72` scale factor (PDF points are 1/72 inch)
//! reproduces it at the requested print density without guessing target
//! pixel dimensions.

use crate::config::BatchConfig;
use crate::error::RasterizeError;
use crate::pipeline::bundle::page_image_name;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF points per inch.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// PDF-to-image rasterisation engine.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Draw every page of the artifact at `pdf_path` into one PNG per page
    /// inside `output_dir`, named via
    /// [`page_image_name`](crate::pipeline::bundle::page_image_name).
    ///
    /// Returns the written paths ordered by page number. A missing or
    /// zero-page artifact is an error; rasterising nothing silently would
    /// hide an upstream rendering bug.
    async fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        config: &BatchConfig,
    ) -> Result<Vec<PathBuf>, RasterizeError>;
}

/// Production rasteriser backed by the pdfium library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        config: &BatchConfig,
    ) -> Result<Vec<PathBuf>, RasterizeError> {
        let pdf_path = pdf_path.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let dpi = config.dpi;

        tokio::task::spawn_blocking(move || rasterize_blocking(&pdf_path, &output_dir, dpi))
            .await
            .map_err(|e| RasterizeError::Internal(format!("Raster task panicked: {}", e)))?
    }
}

/// Blocking implementation of page drawing.
fn rasterize_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    dpi: u32,
) -> Result<Vec<PathBuf>, RasterizeError> {
    if !pdf_path.exists() {
        return Err(RasterizeError::ArtifactMissing {
            path: pdf_path.to_path_buf(),
        });
    }

    let pdfium = bind_pdfium()?;
    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| RasterizeError::ArtifactUnreadable {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(RasterizeError::EmptyArtifact {
            path: pdf_path.to_path_buf(),
        });
    }
    info!("Artifact loaded: {} pages at {} DPI", total_pages, dpi);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));

    let mut page_paths = Vec::with_capacity(total_pages);
    for idx in 0..total_pages {
        let page_num = idx + 1;
        let page = pages
            .get(idx as u16)
            .map_err(|e| RasterizeError::PageRender {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RasterizeError::PageRender {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        let destination = output_dir.join(page_image_name(page_num));
        image
            .save_with_format(&destination, image::ImageFormat::Png)
            .map_err(|e| RasterizeError::ImageWrite {
                path: destination.clone(),
                detail: e.to_string(),
            })?;

        debug!(
            "Rasterised page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        page_paths.push(destination);
    }

    Ok(page_paths)
}

/// Bind a pdfium library: `PDFIUM_LIB_PATH` first, then the executable's
/// directory, then the system loader.
fn bind_pdfium() -> Result<Pdfium, RasterizeError> {
    let search_dir = std::env::var_os("PDFIUM_LIB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./"));

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
        &search_dir,
    ))
    .or_else(|_| Pdfium::bind_to_system_library())
    .map_err(|e| RasterizeError::EngineUnavailable {
        detail: format!("{:?}", e),
    })?;

    Ok(Pdfium::new(bindings))
}

fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / PDF_POINTS_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factor_is_relative_to_pdf_points() {
        assert!((scale_for_dpi(72) - 1.0).abs() < f32::EPSILON);
        assert!((scale_for_dpi(144) - 2.0).abs() < f32::EPSILON);
        assert!((scale_for_dpi(600) - 8.333_333).abs() < 1e-4);
    }

    #[test]
    fn missing_artifact_is_reported_without_binding_pdfium() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = rasterize_blocking(&dir.path().join("report.pdf"), dir.path(), 150).unwrap_err();
        assert!(matches!(err, RasterizeError::ArtifactMissing { .. }));
    }
}
