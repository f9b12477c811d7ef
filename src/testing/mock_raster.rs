//! Mock rasteriser for tests.

use crate::config::BatchConfig;
use crate::error::RasterizeError;
use crate::pipeline::bundle::page_image_name;
use crate::pipeline::raster::PageRasterizer;
use crate::testing::mock_render::parse_fake_artifact;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// PNG magic bytes; enough of an image for tests that only check files
/// exist and are named correctly.
const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A [`PageRasterizer`] that expands a fake artifact written by
/// [`super::MockRenderer`] into stub page images.
///
/// The page count comes from the artifact file itself, so the mock pair
/// exercises the real handoff: whatever rendering wrote is what
/// rasterisation reads. Failure injection is keyed by bundle directory
/// name, which equals the document name.
#[derive(Debug, Default)]
pub struct MockRasterizer {
    failures: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    rasterized: Mutex<Vec<String>>,
}

impl MockRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make rasterisation fail for this document.
    pub fn fail_document(&self, document: &str) {
        self.failures.lock().unwrap().insert(document.to_string());
    }

    /// Sleep this long inside every rasterisation.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Names of successfully rasterised documents, in completion order.
    pub fn rasterized(&self) -> Vec<String> {
        self.rasterized.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRasterizer for MockRasterizer {
    async fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        _config: &BatchConfig,
    ) -> Result<Vec<PathBuf>, RasterizeError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let document = output_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if self.failures.lock().unwrap().contains(&document) {
            return Err(RasterizeError::PageRender {
                page: 1,
                detail: "injected raster failure".to_string(),
            });
        }

        let text = tokio::fs::read_to_string(pdf_path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                RasterizeError::ArtifactMissing {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                RasterizeError::ArtifactUnreadable {
                    path: pdf_path.to_path_buf(),
                    detail: e.to_string(),
                }
            }
        })?;
        let pages = parse_fake_artifact(&text).ok_or_else(|| RasterizeError::ArtifactUnreadable {
            path: pdf_path.to_path_buf(),
            detail: "not a mock artifact".to_string(),
        })?;
        if pages == 0 {
            return Err(RasterizeError::EmptyArtifact {
                path: pdf_path.to_path_buf(),
            });
        }

        let mut page_paths = Vec::with_capacity(pages);
        for page_num in 1..=pages {
            let destination = output_dir.join(page_image_name(page_num));
            tokio::fs::write(&destination, PNG_STUB)
                .await
                .map_err(|e| RasterizeError::ImageWrite {
                    path: destination.clone(),
                    detail: e.to_string(),
                })?;
            page_paths.push(destination);
        }

        self.rasterized.lock().unwrap().push(document);
        Ok(page_paths)
    }
}
