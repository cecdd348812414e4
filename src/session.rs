//! The coordinator that owns both pipelines and the shared extracted text.
//!
//! [`Workbench`] models what the UI layer owns: one analysis orchestrator,
//! one extraction pipeline, and the single "currently extracted text" slot.
//! The slot is written only by the extraction pipeline's completion step and
//! read by the save and transfer actions; a mutex makes each replacement
//! atomic with respect to readers, so a half-updated value is never
//! observable. The two pipelines are independent state machines and may run
//! concurrently with each other, while each rejects overlap of its own kind.

use crate::analyze::{AnalysisOutcome, AnalysisRequest, Analyzer};
use crate::client::ModelClient;
use crate::error::{AnalysisError, ExtractError};
use crate::ocr::{ExtractedText, OcrEngine, PageRasterizer, TextExtractor};
use crate::report;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Coordinator for one user session.
pub struct Workbench {
    analyzer: Analyzer,
    extractor: TextExtractor,
    extracted: Mutex<Option<ExtractedText>>,
}

impl Workbench {
    /// Wire a workbench from its three collaborators.
    pub fn new(
        client: Arc<dyn ModelClient>,
        rasterizer: Arc<dyn PageRasterizer>,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        Self::from_parts(Analyzer::new(client), TextExtractor::new(rasterizer, engine))
    }

    /// Wire a workbench from pre-built pipelines (e.g. an extractor that
    /// already carries a progress sink or a custom size limit).
    pub fn from_parts(analyzer: Analyzer, extractor: TextExtractor) -> Self {
        Self {
            analyzer,
            extractor,
            extracted: Mutex::new(None),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Run an analysis through the owned orchestrator.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.analyzer.analyze(request).await
    }

    /// Run an extraction and, on success, publish the result as the current
    /// extracted text. Failure and cancellation leave the previous value
    /// untouched.
    pub async fn extract(&self, pdf: &Path) -> Result<ExtractedText, ExtractError> {
        let extracted = self.extractor.extract(pdf).await?;
        *self.extracted.lock().expect("extracted lock poisoned") = Some(extracted.clone());
        Ok(extracted)
    }

    /// The current extracted text, if a completed job exists.
    pub fn extracted_text(&self) -> Option<ExtractedText> {
        self.extracted
            .lock()
            .expect("extracted lock poisoned")
            .clone()
    }

    /// Copy the current extracted text into the request's report field.
    /// Fails with [`ExtractError::NothingExtracted`] when no terminal text
    /// exists.
    pub fn apply_extracted(&self, request: &mut AnalysisRequest) -> Result<(), ExtractError> {
        let guard = self.extracted.lock().expect("extracted lock poisoned");
        match guard.as_ref() {
            Some(extracted) => {
                request.report_text = extracted.text.clone();
                Ok(())
            }
            None => Err(ExtractError::NothingExtracted),
        }
    }

    /// Save the current extracted text as `<stem>.txt` under `dir`.
    pub async fn save_extracted(&self, dir: &Path, stem: &str) -> Result<PathBuf, ExtractError> {
        let text = self
            .extracted_text()
            .ok_or(ExtractError::NothingExtracted)?;
        report::save_text_file(dir, stem, &text.text)
            .await
            .map_err(ExtractError::Io)
    }

    /// Drop the current extracted text and reset the extraction pipeline to
    /// idle, disabling save/transfer until a new terminal text exists.
    pub fn clear_extracted(&self) {
        *self.extracted.lock().expect("extracted lock poisoned") = None;
        self.extractor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::ocr::engine::RecognitionProgressFn;
    use async_trait::async_trait;
    use image::DynamicImage;
    use tokio_util::sync::CancellationToken;

    struct StubClient;

    #[async_trait]
    impl ModelClient for StubClient {
        async fn complete(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, AnalysisError> {
            Ok("<conclusion>ok</conclusion>".into())
        }
    }

    struct StubRasterizer;

    #[async_trait]
    impl PageRasterizer for StubRasterizer {
        async fn page_count(&self, _pdf: &Path) -> Result<usize, ExtractError> {
            Ok(1)
        }

        async fn render_page(
            &self,
            _pdf: &Path,
            _page_index: usize,
        ) -> Result<DynamicImage, ExtractError> {
            Ok(DynamicImage::ImageRgb8(image::RgbImage::new(4, 4)))
        }
    }

    struct StubEngine;

    #[async_trait]
    impl OcrEngine for StubEngine {
        async fn recognize(
            &self,
            _page: usize,
            _image: &DynamicImage,
            _on_progress: RecognitionProgressFn,
        ) -> Result<String, ExtractError> {
            Ok("recognised".into())
        }
    }

    fn workbench() -> Workbench {
        Workbench::new(
            Arc::new(StubClient),
            Arc::new(StubRasterizer),
            Arc::new(StubEngine),
        )
    }

    fn pdf_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("input.pdf");
        std::fs::write(&path, b"%PDF-1.4 fixture").unwrap();
        path
    }

    #[tokio::test]
    async fn transfer_before_extraction_fails() {
        let wb = workbench();
        let mut request = AnalysisRequest::new("p {{COMPANY_REPORT}}", "old");
        let err = wb.apply_extracted(&mut request).unwrap_err();
        assert!(matches!(err, ExtractError::NothingExtracted));
        assert_eq!(request.report_text, "old");
    }

    #[tokio::test]
    async fn extraction_publishes_and_transfer_applies() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = pdf_fixture(dir.path());
        let wb = workbench();

        wb.extract(&pdf).await.unwrap();
        let current = wb.extracted_text().expect("text published");
        assert!(current.text.contains("--- Page 1 ---"));

        let mut request = AnalysisRequest::new("p {{COMPANY_REPORT}}", "old");
        wb.apply_extracted(&mut request).unwrap();
        assert_eq!(request.report_text, current.text);
    }

    #[tokio::test]
    async fn clear_drops_text_and_resets_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = pdf_fixture(dir.path());
        let wb = workbench();

        wb.extract(&pdf).await.unwrap();
        assert!(wb.extracted_text().is_some());

        wb.clear_extracted();
        assert!(wb.extracted_text().is_none());
        assert_eq!(wb.extractor().status(), crate::ocr::ExtractStatus::Idle);
        assert!(matches!(
            wb.save_extracted(dir.path(), "x").await.unwrap_err(),
            ExtractError::NothingExtracted
        ));
    }

    #[tokio::test]
    async fn save_extracted_writes_txt() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = pdf_fixture(dir.path());
        let wb = workbench();

        wb.extract(&pdf).await.unwrap();
        let out = wb.save_extracted(dir.path(), "report").await.unwrap();
        assert!(out.ends_with("report.txt"));
        let saved = std::fs::read_to_string(out).unwrap();
        assert!(saved.contains("recognised"));
    }
}
