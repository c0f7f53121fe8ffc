//! Error types for the edgequake-crew library.
//!
//! A team run has no partial-success mode: the first failure anywhere
//! (unreadable CV, provider missing, one stage erroring) ends the run. So
//! there is a single fatal error type, [`CrewError`], returned as
//! `Err(CrewError)` from every public entry point.
//!
//! Stage failures wrap the underlying cause in [`CrewError::StageFailed`]
//! so the message names the agent that broke the chain.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-crew library.
#[derive(Debug, Error)]
pub enum CrewError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but cannot be used for this operation.
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error while reading the text layer of a page.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    ExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call exceeded `api_timeout_secs`.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// A stage of the team failed; no later stage was run.
    #[error("Stage {index} ({agent}) failed: {source}")]
    StageFailed {
        index: usize,
        agent: String,
        #[source]
        source: Box<CrewError>,
    },

    // ── Search errors ─────────────────────────────────────────────────────
    /// The web-search backend could not be reached or answered with an error.
    #[error("Web search for '{query}' failed: {reason}")]
    SearchFailed { query: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrewError {
    /// Wrap `self` as the failure of stage `index` run by `agent`.
    pub fn in_stage(self, index: usize, agent: impl Into<String>) -> Self {
        CrewError::StageFailed {
            index,
            agent: agent.into(),
            source: Box::new(self),
        }
    }
}
