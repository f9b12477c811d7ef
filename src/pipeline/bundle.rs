//! Per-document output bundles: directory layout and artifact naming.
//!
//! Every document gets its own subdirectory under the output root. For a
//! document named `invoice`:
//!
//! ```text
//! output/invoice/
//! ├── report.pdf       paginated artifact (one content-height page)
//! ├── page_001.png     rasterised pages, 1-indexed
//! ├── page_002.png
//! └── invoice.html     verbatim copy of the source document
//! ```
//!
//! Page numbers are zero-padded to three digits so lexicographic and numeric
//! ordering agree; a 1000-page document simply grows a fourth digit.

use crate::pipeline::source::Document;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the page image for 1-indexed `page_num`.
pub fn page_image_name(page_num: usize) -> String {
    format!("page_{page_num:03}.png")
}

/// Filesystem locations of one document's bundle.
///
/// Created by [`OutputBundle::prepare`]; `page_paths` stays empty until the
/// rasterisation stage fills it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBundle {
    /// The bundle directory, `output/<name>/`.
    pub directory_path: PathBuf,
    /// Destination of the paginated PDF artifact.
    pub pdf_path: PathBuf,
    /// Destination of the copied source document (original file name).
    pub copied_source_path: PathBuf,
    /// Page images in page order; filled after rasterisation.
    pub page_paths: Vec<PathBuf>,
    source_path: PathBuf,
}

impl OutputBundle {
    /// Create the bundle directory for `document` and derive artifact paths.
    ///
    /// Creating the directory is idempotent: an existing bundle directory is
    /// reused as-is and nothing inside it is deleted. Later stages overwrite
    /// individual artifacts instead.
    pub async fn prepare(
        output_root: &Path,
        document: &Document,
        pdf_stem: &str,
    ) -> io::Result<Self> {
        let directory_path = output_root.join(&document.name);
        tokio::fs::create_dir_all(&directory_path).await?;
        debug!("Prepared bundle directory '{}'", directory_path.display());

        let source_file_name = document
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.{}", document.name, "html"));

        Ok(Self {
            pdf_path: directory_path.join(format!("{pdf_stem}.pdf")),
            copied_source_path: directory_path.join(source_file_name),
            page_paths: Vec::new(),
            source_path: document.path.clone(),
            directory_path,
        })
    }

    /// Copy the original source document into the bundle, overwriting any
    /// previous copy. Returns the number of bytes copied.
    pub async fn archive_source(&self) -> io::Result<u64> {
        let bytes = tokio::fs::copy(&self.source_path, &self.copied_source_path).await?;
        debug!(
            "Archived '{}' → '{}' ({} bytes)",
            self.source_path.display(),
            self.copied_source_path.display(),
            bytes
        );
        Ok(bytes)
    }

    /// Path of the page image for 1-indexed `page_num` inside this bundle.
    pub fn page_image_path(&self, page_num: usize) -> PathBuf {
        self.directory_path.join(page_image_name(page_num))
    }
}
