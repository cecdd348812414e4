//! The OCR extraction state machine.
//!
//! States: `Idle → Loading → {Rendering → Recognizing}* → Done`, with exits
//! to `Cancelled` or `Failed` from anywhere inside the loop. The job is
//! owned by the extractor and mutated only by its own steps; `reset` drops
//! it back to `Idle`.
//!
//! ## Cancellation latency
//!
//! The cancellation token is checked at loop entry and again between
//! rasterisation and recognition. Whatever step is in flight when the
//! signal fires runs to completion, so at most one raster render or one OCR
//! pass executes after cancellation — the token is never preemptive.
//! Accumulated page text is discarded on cancel; partial results are not
//! exposed (see DESIGN.md).
//!
//! ## Failure model
//!
//! Any page failure is fatal to the whole job: the status becomes `Failed`
//! carrying a structured [`ExtractError`], never a partial success. The
//! in-flight guard is released on every exit so a retry can start
//! immediately; `Failed`/`Cancelled` stick as the visible status until the
//! next run or [`TextExtractor::reset`].

use crate::error::ExtractError;
use crate::ocr::engine::{OcrEngine, RecognitionProgressFn};
use crate::ocr::raster::PageRasterizer;
use crate::progress::{ExtractProgress, NoopExtractProgress, ProgressSink};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default upper bound on the input file size: 50 MB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Observable status of the extraction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStatus {
    /// No job, or the last job was cleared.
    Idle,
    /// Validations passed; opening the document.
    Loading,
    /// Rasterising the given page (1-based).
    Rendering { page: usize, total: usize },
    /// Running OCR on the given page (1-based).
    Recognizing { page: usize, total: usize },
    /// All pages recognised; terminal text available.
    Done,
    /// Cancelled by the user; accumulated text was discarded.
    Cancelled,
    /// A precondition or page step failed; see the returned error.
    Failed,
}

/// The terminal accumulated text of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    /// Page-delimited, trimmed text.
    pub text: String,
    /// Number of pages that contributed.
    pub page_count: usize,
}

/// The OCR extraction pipeline.
pub struct TextExtractor {
    rasterizer: Arc<dyn PageRasterizer>,
    engine: Arc<dyn OcrEngine>,
    progress: ProgressSink,
    max_file_size: u64,
    status: Mutex<ExtractStatus>,
    in_flight: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl TextExtractor {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            rasterizer,
            engine,
            progress: Arc::new(NoopExtractProgress),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            status: Mutex::new(ExtractStatus::Idle),
            in_flight: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Attach a progress sink.
    pub fn with_progress(mut self, sink: Arc<dyn ExtractProgress>) -> Self {
        self.progress = sink;
        self
    }

    /// Override the input size limit (bytes).
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Current job status.
    pub fn status(&self) -> ExtractStatus {
        *self.status.lock().expect("status lock poisoned")
    }

    /// True while a job is running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request cooperative cancellation of the running job, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.cancel.lock().expect("cancel lock poisoned").as_ref() {
            info!("Extraction cancellation requested");
            token.cancel();
        }
    }

    /// Drop the job and return to `Idle`. No-op while a job is running —
    /// cancel first.
    pub fn reset(&self) {
        if !self.is_running() {
            self.set_status(ExtractStatus::Idle);
        }
    }

    fn set_status(&self, status: ExtractStatus) {
        *self.status.lock().expect("status lock poisoned") = status;
    }

    /// Run the whole pipeline on a PDF file.
    pub async fn extract(&self, pdf: &Path) -> Result<ExtractedText, ExtractError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ExtractError::InFlight);
        }

        let result = self.run(pdf).await;

        match &result {
            Ok(_) => self.set_status(ExtractStatus::Done),
            Err(e) if e.is_cancelled() => {
                warn!("Extraction cancelled");
                self.set_status(ExtractStatus::Cancelled);
            }
            Err(e) => {
                warn!("Extraction failed: {e}");
                self.set_status(ExtractStatus::Failed);
            }
        }

        *self.cancel.lock().expect("cancel lock poisoned") = None;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    /// Run the pipeline on in-memory PDF bytes via a managed tempfile.
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        let mut tmp = tempfile::NamedTempFile::new()
            .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
        tmp.write_all(bytes)
            .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
        // `tmp` is dropped (and the file deleted) when extraction returns.
        self.extract(tmp.path()).await
    }

    async fn run(&self, pdf: &Path) -> Result<ExtractedText, ExtractError> {
        let token = CancellationToken::new();
        *self.cancel.lock().expect("cancel lock poisoned") = Some(token.clone());

        validate_input(pdf, self.max_file_size).await?;

        self.set_status(ExtractStatus::Loading);
        let total = self.rasterizer.page_count(pdf).await?;
        if total == 0 {
            return Err(ExtractError::EmptyDocument);
        }
        info!("Document opened: {} page(s)", total);
        self.progress.on_extract_start(total);

        let mut accumulated = String::new();

        for page in 1..=total {
            // Checkpoint 1: loop entry.
            if token.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }

            self.set_status(ExtractStatus::Rendering { page, total });
            self.progress.on_page_render(page, total);
            let image = self.rasterizer.render_page(pdf, page - 1).await?;

            // Checkpoint 2: after rasterising, before OCR.
            if token.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }

            self.set_status(ExtractStatus::Recognizing { page, total });
            let sink = Arc::clone(&self.progress);
            let on_progress: RecognitionProgressFn =
                Arc::new(move |fraction| sink.on_recognition_progress(page, fraction));
            let text = self.engine.recognize(page, &image, on_progress).await?;

            debug!("Page {}/{}: {} chars recognised", page, total, text.len());
            accumulated.push_str(&format!("\n--- Page {page} ---\n{text}\n"));
            self.progress.on_page_complete(page, total, text.len());
        }

        let extracted = ExtractedText {
            text: accumulated.trim().to_string(),
            page_count: total,
        };
        info!(
            "Extraction complete: {} page(s), {} chars",
            total,
            extracted.text.len()
        );
        self.progress.on_extract_complete(total);
        Ok(extracted)
    }
}

/// Preconditions: PDF extension or `%PDF-` magic, then the size cap.
/// Runs before any page is touched, so an oversized file is rejected
/// without opening the document.
async fn validate_input(path: &Path, max_size: u64) -> Result<(), ExtractError> {
    let has_pdf_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if !has_pdf_extension {
        // Extensionless inputs (tempfiles, pipes dumped to disk) still pass
        // if the content is a PDF.
        let mut file = tokio::fs::File::open(path).await?;
        let mut magic = [0u8; 5];
        let n = file.read(&mut magic).await?;
        if n < magic.len() || &magic != b"%PDF-" {
            return Err(ExtractError::InvalidFileType {
                path: path.to_path_buf(),
            });
        }
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > max_size {
        return Err(ExtractError::FileTooLarge {
            size: metadata.len(),
            limit: max_size,
        });
    }

    Ok(())
}
