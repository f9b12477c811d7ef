//! Document enumeration: scan the input directory for convertible documents.
//!
//! Enumeration is shallow (no recursion) and keeps the operating system's
//! directory order; only the `.html` extension is matched, case-insensitively.
//! An empty directory is a valid, empty batch — not an error.

use crate::error::BatchError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension (lowercased) that marks a convertible document.
pub const DOCUMENT_EXTENSION: &str = "html";

/// One convertible document discovered in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path of the source file.
    pub path: PathBuf,
    /// Document name: the file stem, used as the bundle directory name.
    pub name: String,
}

impl Document {
    /// Build a document from a path, deriving the name from the file stem.
    ///
    /// Returns `None` when the path has no UTF-8 representable stem, since
    /// the name has to become a directory name and a report key.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_stem()?.to_str()?.to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self { path, name })
    }

    /// The full file name of the source document, e.g. `invoice.html`.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()?.to_str()
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        .unwrap_or(false)
}

/// List every `.html` document directly inside `dir`.
///
/// Subdirectories, other extensions (including `.htm`) and entries without a
/// usable name are skipped. The returned order is whatever the OS yields;
/// callers needing a stable order sort the result themselves.
///
/// # Errors
/// [`BatchError::InputDirNotFound`] when `dir` does not exist,
/// [`BatchError::InputDirUnreadable`] when it cannot be scanned.
pub fn enumerate_documents(dir: &Path) -> Result<Vec<Document>, BatchError> {
    if !dir.exists() {
        return Err(BatchError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| BatchError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry in '{}': {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_document(&path) {
            continue;
        }
        match Document::from_path(path) {
            Some(document) => documents.push(document),
            None => warn!("Skipping document without a usable name in '{}'", dir.display()),
        }
    }

    debug!("Enumerated {} documents in '{}'", documents.len(), dir.display());
    Ok(documents)
}
