//! # report-analyzer
//!
//! Analyze company reports with a hosted LLM: substitute the report into a
//! prompt template, send it through a same-origin proxy, parse the tagged
//! response into named sections, and render/export the result as HTML. A
//! second, independent pipeline extracts report text from PDFs with
//! per-page OCR, cooperative cancellation, and progress reporting.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Analysis                              Extraction
//!  │                                     │
//!  ├─ 1. Validate  prompt/report/token   ├─ 1. Validate  type + size
//!  ├─ 2. Fill      {{COMPANY_REPORT}}    ├─ 2. Open      page count
//!  ├─ 3. Request   proxy → model         ├─ 3. Raster    pdfium, per page
//!  ├─ 4. Parse     <tag>…</tag> sections ├─ 4. OCR       engine, per page
//!  └─ 5. Render    HTML fragment         └─ 5. Collect   page-delimited text
//! ```
//!
//! Both pipelines are single-flight state machines with cooperative
//! cancellation checked at suspension points; they may run concurrently
//! with each other. External collaborators (model client, rasteriser, OCR
//! engine) sit behind traits so everything above is testable with mocks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_analyzer::{AnalysisRequest, Analyzer, ProxyClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(ProxyClient::new("http://localhost:3000"));
//!     let analyzer = Analyzer::new(client);
//!     let request = AnalysisRequest::new(
//!         report_analyzer::DEFAULT_PROMPT_TEMPLATE,
//!         "Acme Corp announced record revenue.",
//!     );
//!     let outcome = analyzer.analyze(&request).await?;
//!     println!("{}", outcome.html);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cli`      | on      | Enables the `report-analyzer` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `ocr-ocrs` | off     | Pure-Rust OCR engine (`ocrs` + `rten`); models loaded from disk |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod filename;
pub mod ocr;
pub mod parse;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod report;
pub mod server;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{AnalysisOutcome, AnalysisPhase, AnalysisRequest, Analyzer};
pub use client::{ModelClient, ProxyClient};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, ExtractError};
pub use ocr::{ExtractStatus, ExtractedText, OcrEngine, PageRasterizer, PdfiumRasterizer, TextExtractor};
pub use parse::{parse_response, AnalysisBody, Section, SectionKey};
pub use progress::{ExtractProgress, NoopExtractProgress, ProgressSink};
pub use prompts::{DEFAULT_PROMPT_TEMPLATE, REPORT_PLACEHOLDER};
pub use render::render_analysis;
pub use session::Workbench;
