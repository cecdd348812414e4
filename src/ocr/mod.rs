//! The OCR extraction pipeline.
//!
//! Each submodule implements one stage; the seams are traits so the
//! pipeline is testable without pdfium or OCR models installed.
//!
//! ## Data Flow
//!
//! ```text
//! file ──▶ validate ──▶ raster ──▶ engine ──▶ accumulate
//! (path)   (type/size)  (pdfium)   (OCR)      (page-delimited text)
//! ```
//!
//! 1. [`extract`] — the state machine: preconditions, per-page loop,
//!    cancellation checkpoints, page-delimited accumulation
//! 2. [`raster`]  — rasterise one page to an image; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`engine`]  — recognise text in a page image, reporting fractional
//!    progress

pub mod engine;
pub mod extract;
pub mod raster;

pub use engine::OcrEngine;
pub use extract::{ExtractStatus, ExtractedText, TextExtractor, DEFAULT_MAX_FILE_SIZE};
pub use raster::{PageRasterizer, PdfiumRasterizer};

#[cfg(feature = "ocr-ocrs")]
pub use engine::OcrsEngine;
