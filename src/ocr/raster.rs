//! PDF rasterisation: render one page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio worker threads never stall on CPU-heavy rendering.
//!
//! ## Why reopen the document per call?
//!
//! A pdfium document borrows the `Pdfium` binding and is not `Send`, so it
//! cannot be held across `.await` points by an async pipeline. Each call
//! opens, works, and closes inside one blocking task. The per-page loop in
//! [`crate::ocr::extract`] pays a re-open per page; for OCR workloads the
//! recognition step dominates by orders of magnitude, and the reopen keeps
//! every cancellation checkpoint outside pdfium.

use crate::error::ExtractError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Default cap on the rendered page width in pixels.
///
/// 2000 px keeps small print legible for OCR while bounding the pixel
/// buffer pdfium allocates for oversized pages.
pub const DEFAULT_MAX_RENDER_WIDTH: u32 = 2000;

/// The rasterisation collaborator: a PDF page in, a raster image out.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Number of pages in the document. Fails with
    /// [`ExtractError::CorruptDocument`] when the file cannot be opened as
    /// a PDF at all.
    async fn page_count(&self, pdf: &Path) -> Result<usize, ExtractError>;

    /// Render the page at `page_index` (0-based) to an image.
    async fn render_page(
        &self,
        pdf: &Path,
        page_index: usize,
    ) -> Result<DynamicImage, ExtractError>;
}

/// Production rasteriser backed by pdfium.
pub struct PdfiumRasterizer {
    max_width: u32,
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self {
            max_width: DEFAULT_MAX_RENDER_WIDTH,
        }
    }

    /// Override the rendered width cap (clamped to a sane minimum).
    pub fn with_max_width(px: u32) -> Self {
        Self {
            max_width: px.max(100),
        }
    }
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn page_count(&self, pdf: &Path) -> Result<usize, ExtractError> {
        let path = pdf.to_path_buf();
        tokio::task::spawn_blocking(move || page_count_blocking(&path))
            .await
            .map_err(|e| ExtractError::Internal(format!("page-count task panicked: {e}")))?
    }

    async fn render_page(
        &self,
        pdf: &Path,
        page_index: usize,
    ) -> Result<DynamicImage, ExtractError> {
        let path = pdf.to_path_buf();
        let max_width = self.max_width;
        tokio::task::spawn_blocking(move || render_page_blocking(&path, page_index, max_width))
            .await
            .map_err(|e| ExtractError::Internal(format!("render task panicked: {e}")))?
    }
}

fn open_document<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| ExtractError::CorruptDocument {
            detail: format!("{e:?}"),
        })
}

fn page_count_blocking(path: &Path) -> Result<usize, ExtractError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path)?;
    Ok(document.pages().len() as usize)
}

fn render_page_blocking(
    path: &Path,
    page_index: usize,
    max_width: u32,
) -> Result<DynamicImage, ExtractError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path)?;
    let pages = document.pages();

    let page = pages
        .get(page_index as u16)
        .map_err(|e| ExtractError::RenderFailed {
            page: page_index + 1,
            detail: format!("{e:?}"),
        })?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_width as i32)
        .set_maximum_height(max_width as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractError::RenderFailed {
            page: page_index + 1,
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_index + 1,
        image.width(),
        image.height()
    );

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_cap_has_a_floor() {
        let r = PdfiumRasterizer::with_max_width(1);
        assert_eq!(r.max_width, 100);
    }

    #[test]
    fn default_width_cap() {
        assert_eq!(PdfiumRasterizer::new().max_width, DEFAULT_MAX_RENDER_WIDTH);
    }
}
