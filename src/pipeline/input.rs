//! Input resolution: validate CV paths and enumerate a CV directory.
//!
//! We check the PDF magic bytes (`%PDF`) before handing a path to pdfium so
//! that a stray `.docx` renamed to `.pdf` produces a readable error instead
//! of a pdfium load failure.

use crate::error::CrewError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_pdf(path: impl AsRef<Path>) -> Result<PathBuf, CrewError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(CrewError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(CrewError::InvalidInput {
            path,
            reason: "expected a PDF file, found a directory".into(),
        });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            // Files shorter than four bytes are left for pdfium to reject.
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(CrewError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CrewError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(CrewError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// List every `.pdf` file (case-insensitive) directly inside `dir`,
/// sorted by file name.
///
/// Subdirectories are not descended into.
pub fn list_pdfs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, CrewError> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Err(CrewError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(CrewError::InvalidInput {
            path: dir.to_path_buf(),
            reason: "expected a directory of PDF files".into(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => CrewError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => CrewError::Internal(format!("read_dir {}: {e}", dir.display())),
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CrewError::Internal(format!("read_dir entry: {e}")))?;
        let path = entry.path();
        if path.is_file() && has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("Found {} PDF files in {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
