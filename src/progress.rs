//! Progress sink for the OCR extraction pipeline.
//!
//! Inject an [`Arc<dyn ExtractProgress>`] via
//! [`crate::ocr::TextExtractor::with_progress`] to receive events as the
//! pipeline walks the document. Events are side-channel notifications only:
//! they never influence control flow, which keeps the pipeline fully
//! testable without a UI. Forward them to a terminal progress bar, a
//! WebSocket, or a log — the library does not care how the host application
//! communicates.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// The pipeline is strictly sequential, so calls arrive in order, but
/// implementations must still be `Send + Sync` because the pipeline hops
/// between async tasks and blocking threads.
pub trait ExtractProgress: Send + Sync {
    /// Called once after the document opened, before any page work.
    fn on_extract_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before page `page` (1-indexed) is rasterised.
    fn on_page_render(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called during recognition of page `page` with a completion fraction
    /// in `0.0..=1.0`. Engines that cannot observe intermediate progress
    /// report only the endpoints.
    fn on_recognition_progress(&self, page: usize, fraction: f32) {
        let _ = (page, fraction);
    }

    /// Called when a page's text has been appended to the accumulator.
    fn on_page_complete(&self, page: usize, total_pages: usize, text_len: usize) {
        let _ = (page, total_pages, text_len);
    }

    /// Called once when every page finished and the job is `Done`.
    fn on_extract_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopExtractProgress;

impl ExtractProgress for NoopExtractProgress {}

/// Convenience alias matching the type the extractor stores.
pub type ProgressSink = Arc<dyn ExtractProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        renders: AtomicUsize,
        completes: AtomicUsize,
    }

    impl ExtractProgress for CountingSink {
        fn on_page_render(&self, _page: usize, _total: usize) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_sink_does_not_panic() {
        let sink = NoopExtractProgress;
        sink.on_extract_start(3);
        sink.on_page_render(1, 3);
        sink.on_recognition_progress(1, 0.5);
        sink.on_page_complete(1, 3, 128);
        sink.on_extract_complete(3);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let sink = CountingSink {
            renders: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
        };
        sink.on_page_render(1, 2);
        sink.on_page_render(2, 2);
        sink.on_page_complete(1, 2, 10);
        assert_eq!(sink.renders.load(Ordering::SeqCst), 2);
        assert_eq!(sink.completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_sink_works() {
        let sink: ProgressSink = Arc::new(NoopExtractProgress);
        sink.on_extract_start(10);
        sink.on_recognition_progress(1, 1.0);
    }
}
