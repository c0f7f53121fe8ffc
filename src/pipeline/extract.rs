//! PDF text extraction via pdfium.
//!
//! pdfium wraps a C++ library that keeps thread-local state and blocks, so
//! the whole load-and-read cycle runs inside `tokio::task::spawn_blocking`.
//! The library is bound through `pdfium-auto`, which downloads and caches
//! libpdfium on first use (or honours `PDFIUM_LIB_PATH`).
//!
//! Extraction is deliberately plain: the text layer of every page in page
//! order, each page terminated by a newline, the whole thing trimmed. No
//! layout is reconstructed; downstream stages only need the words.

use crate::error::CrewError;
use crate::pipeline::input;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The extracted text of one PDF.
///
/// Immutable once built: the fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    source: PathBuf,
    text: String,
    page_count: usize,
}

impl Document {
    /// Wrap text that did not come from a PDF (e.g. a CV pasted as text).
    pub fn from_text(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            page_count: 0,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// File name of the source, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract the concatenated text of every page of the PDF at `path`.
///
/// A PDF whose pages carry no text layer (blank or scanned) yields a
/// [`Document`] with empty text; that is not an error.
pub async fn extract_text(
    path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<Document, CrewError> {
    let path = input::resolve_pdf(path)?;
    let pwd = password.map(|s| s.to_string());

    let doc = tokio::task::spawn_blocking(move || extract_text_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| CrewError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!(
        "Extracted {} chars from {} ({} pages)",
        doc.text.len(),
        doc.file_name(),
        doc.page_count
    );
    Ok(doc)
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(pdf_path: &Path, password: Option<&str>) -> Result<Document, CrewError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| CrewError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), format!("{:?}", e)))?;

    let mut page_texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| CrewError::ExtractionFailed {
            path: pdf_path.to_path_buf(),
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        let page_text = text.all();
        debug!("Page {}: {} chars", idx + 1, page_text.len());
        page_texts.push(page_text);
    }

    Ok(assemble_pages(pdf_path, &page_texts))
}

/// Join per-page text layers in page order into one [`Document`].
///
/// Every page counts towards `page_count`, including pages with no text.
fn assemble_pages(source: &Path, pages: &[String]) -> Document {
    let mut raw = String::new();
    for page in pages {
        raw.push_str(page);
        raw.push('\n');
    }
    Document {
        source: source.to_path_buf(),
        text: normalise_text(&raw),
        page_count: pages.len(),
    }
}

/// Map a pdfium load failure onto the matching error variant.
fn classify_load_error(path: &Path, had_password: bool, detail: String) -> CrewError {
    if detail.to_lowercase().contains("password") {
        if had_password {
            CrewError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            CrewError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        CrewError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

/// CRLF/CR → LF, then trim the whole text.
fn normalise_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_text_line_endings_and_trim() {
        assert_eq!(
            normalise_text("  Jane Doe\r\nBachelor's degree in CS\r\n\n"),
            "Jane Doe\nBachelor's degree in CS"
        );
    }

    #[test]
    fn normalise_blank_pages_to_empty() {
        assert_eq!(normalise_text("\n\n \n"), "");
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn cv_page_text_survives_assembly() {
        let doc = assemble_pages(
            Path::new("tests/fixtures/cv_bachelor.pdf"),
            &pages(&[
                "Jane Doe\r\nFullstack Developer\r\nEducation: Bachelor's degree in CS, University of Lyon, 2018\r\n",
            ]),
        );
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.file_name(), "cv_bachelor.pdf");
        assert!(doc.text().contains("Bachelor's degree in CS"));
        assert!(!doc.text().contains('\r'));
        assert!(doc.text().starts_with("Jane Doe\n"));
    }

    #[test]
    fn blank_page_gives_empty_document() {
        let doc = assemble_pages(Path::new("blank.pdf"), &pages(&[""]));
        assert_eq!(doc.page_count(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn pages_join_in_order_and_blank_pages_count() {
        let doc = assemble_pages(
            Path::new("cv.pdf"),
            &pages(&["Jane Doe", "", "Skills: Python, React"]),
        );
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.text(), "Jane Doe\n\nSkills: Python, React");
    }

    #[test]
    fn classify_password_errors() {
        let p = Path::new("cv.pdf");
        assert!(matches!(
            classify_load_error(p, false, "PasswordError".into()),
            CrewError::PasswordRequired { .. }
        ));
        assert!(matches!(
            classify_load_error(p, true, "PasswordError".into()),
            CrewError::WrongPassword { .. }
        ));
        assert!(matches!(
            classify_load_error(p, false, "FormatError".into()),
            CrewError::CorruptPdf { .. }
        ));
    }

    #[test]
    fn document_accessors() {
        let doc = Document::from_text("cvs/jane.pdf", "Python, React");
        assert_eq!(doc.file_name(), "jane.pdf");
        assert_eq!(doc.text(), "Python, React");
        assert_eq!(doc.page_count(), 0);
        assert!(!doc.is_empty());
    }
}
