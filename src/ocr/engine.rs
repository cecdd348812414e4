//! The OCR collaborator: a page image in, recognized text out.
//!
//! The trait takes the 1-based page number purely for error attribution —
//! a failed recognition is fatal for the whole job and the message should
//! name the page. Recognition progress flows through the provided callback
//! as a fraction in `0.0..=1.0`; engines without intermediate progress
//! report only the endpoints.
//!
//! [`OcrsEngine`] (feature `ocr-ocrs`) is a pure-Rust engine; it loads the
//! detection and recognition models from a directory supplied by the
//! caller.

use crate::error::ExtractError;
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;

/// Fractional recognition progress callback.
pub type RecognitionProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// A collaborator that recognises text in a raster image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text on `image` (page `page`, 1-based).
    async fn recognize(
        &self,
        page: usize,
        image: &DynamicImage,
        on_progress: RecognitionProgressFn,
    ) -> Result<String, ExtractError>;
}

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_engine::OcrsEngine;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_engine {
    use super::*;
    use std::path::Path;

    /// Pure-Rust OCR engine backed by the `ocrs` crate.
    ///
    /// The engine is `Send + Sync` and its methods take `&self`, so one
    /// instance serves the whole pipeline; recognition itself is CPU-bound
    /// and runs on the blocking pool.
    pub struct OcrsEngine {
        engine: Arc<ocrs::OcrEngine>,
    }

    impl OcrsEngine {
        /// Load the detection and recognition models from `model_dir`.
        /// Expects `text-detection.rten` and `text-recognition.rten`, the
        /// filenames the published ocrs models ship under.
        pub fn from_model_dir(model_dir: &Path) -> Result<Self, ExtractError> {
            let detection = rten::Model::load_file(model_dir.join("text-detection.rten"))
                .map_err(|e| {
                    ExtractError::Internal(format!("failed to load detection model: {e}"))
                })?;
            let recognition = rten::Model::load_file(model_dir.join("text-recognition.rten"))
                .map_err(|e| {
                    ExtractError::Internal(format!("failed to load recognition model: {e}"))
                })?;

            let engine = ocrs::OcrEngine::new(ocrs::OcrEngineParams {
                detection_model: Some(detection),
                recognition_model: Some(recognition),
                ..Default::default()
            })
            .map_err(|e| ExtractError::Internal(format!("failed to create OCR engine: {e}")))?;

            Ok(Self {
                engine: Arc::new(engine),
            })
        }
    }

    #[async_trait]
    impl OcrEngine for OcrsEngine {
        async fn recognize(
            &self,
            page: usize,
            image: &DynamicImage,
            on_progress: RecognitionProgressFn,
        ) -> Result<String, ExtractError> {
            on_progress(0.0);

            let engine = Arc::clone(&self.engine);
            let rgb = image.to_rgb8();
            let text = tokio::task::spawn_blocking(move || {
                let (width, height) = rgb.dimensions();
                let source = ocrs::ImageSource::from_bytes(rgb.as_raw(), (width, height))
                    .map_err(|e| ExtractError::RecognitionFailed {
                        page,
                        detail: format!("image conversion failed: {e}"),
                    })?;
                let input = engine.prepare_input(source).map_err(|e| {
                    ExtractError::RecognitionFailed {
                        page,
                        detail: format!("input preparation failed: {e}"),
                    }
                })?;
                engine
                    .get_text(&input)
                    .map_err(|e| ExtractError::RecognitionFailed {
                        page,
                        detail: e.to_string(),
                    })
            })
            .await
            .map_err(|e| ExtractError::Internal(format!("recognition task panicked: {e}")))??;

            on_progress(1.0);
            Ok(text)
        }
    }
}
