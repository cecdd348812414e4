//! Error types for the report-analyzer library.
//!
//! Two distinct error types reflect the two pipelines:
//!
//! * [`AnalysisError`] — everything that can go wrong between "the user hit
//!   analyze" and "rendered HTML exists": validation, transport, a non-2xx
//!   proxy response, or user cancellation.
//!
//! * [`ExtractError`] — failures of the OCR extraction pipeline, categorized
//!   at the point of failure (invalid file, oversized file, corrupt document,
//!   render or recognition failure) rather than by matching substrings of an
//!   opaque message.
//!
//! Cancellation is deliberately a variant of each enum and not a separate
//! channel: callers distinguish it with [`AnalysisError::is_cancelled`] /
//! [`ExtractError::is_cancelled`] and present it as an informational state,
//! not a failure. Every variant is terminal for the current operation; the
//! owning state machine releases its in-flight guard before returning, so the
//! caller can retry immediately.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the analysis orchestrator and the model client.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Validation ────────────────────────────────────────────────────────
    /// The prompt template is empty or whitespace-only.
    #[error("Please enter an analysis prompt.")]
    EmptyPrompt,

    /// The report text is empty or whitespace-only.
    #[error("Please paste a company report to analyze.")]
    EmptyReport,

    /// The prompt template does not contain the substitution placeholder.
    #[error("The prompt must contain the placeholder {{{{COMPANY_REPORT}}}} where the report content will be inserted.")]
    MissingPlaceholder,

    // ── Control ───────────────────────────────────────────────────────────
    /// A second analysis was started while one is still in flight.
    /// Requests are never queued; callers should disable their trigger
    /// while [`crate::analyze::Analyzer::is_running`] reports true.
    #[error("An analysis is already in progress.")]
    InFlight,

    /// The user cancelled the analysis. Not a failure.
    #[error("Analysis was cancelled.")]
    Cancelled,

    // ── Collaborator failures ─────────────────────────────────────────────
    /// The proxy could not be reached at all (DNS, refused connection,
    /// closed socket mid-response).
    #[error("Network error reaching the analysis service: {reason}")]
    Transport { reason: String },

    /// The proxy answered with a non-success status. `message` is the
    /// best-effort extracted error body, else `"HTTP <status>: <reason>"`.
    #[error("{message}")]
    Api { status: u16, message: String },

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// True for user-initiated cancellation, which the UI should render as
    /// an informational state rather than an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }
}

/// Errors surfaced by the OCR extraction pipeline.
///
/// Each variant's display text is the user-facing explanation; no caller
/// should need to pattern-match message substrings to decide what happened.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Preconditions ─────────────────────────────────────────────────────
    /// The selected file has neither a `.pdf` extension nor a `%PDF-` header.
    #[error("Invalid file type: '{path}' is not a PDF file. Select a file with a .pdf extension.")]
    InvalidFileType { path: PathBuf },

    /// The file exceeds the configured size limit.
    #[error("File too large: {size} bytes exceeds the {limit} byte limit. Try a smaller or compressed PDF.")]
    FileTooLarge { size: u64, limit: u64 },

    /// The document opened but reports zero pages.
    #[error("PDF appears to be empty or corrupted.")]
    EmptyDocument,

    /// The document could not be opened at all.
    #[error("PDF could not be read: {detail}. Try a different PDF file.")]
    CorruptDocument { detail: String },

    // ── Page loop ─────────────────────────────────────────────────────────
    /// Rasterisation of one page failed; fatal for the whole job.
    #[error("Rasterisation failed on page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// OCR of one page failed; fatal for the whole job.
    #[error("Text recognition failed on page {page}: {detail}")]
    RecognitionFailed { page: usize, detail: String },

    // ── Control ───────────────────────────────────────────────────────────
    /// A second extraction was started while one is still in flight.
    #[error("An extraction is already in progress.")]
    InFlight,

    /// The user cancelled the extraction. Accumulated page text is
    /// discarded. Not a failure.
    #[error("Extraction was cancelled.")]
    Cancelled,

    /// A save or transfer was requested but no terminal extracted text
    /// exists (nothing extracted yet, or the job was cleared).
    #[error("No text to save. Extract text from a PDF first.")]
    NothingExtracted,

    // ── Plumbing ──────────────────────────────────────────────────────────
    /// Filesystem failure reading the input or writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error (a blocking task panicked, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// True for user-initiated cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExtractError::Cancelled)
    }
}
