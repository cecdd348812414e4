//! CLI binary for report-analyzer.
//!
//! A thin shim over the library crate: `serve` runs the proxy, `analyze`
//! drives the analysis pipeline against a running proxy, `extract` runs the
//! OCR pipeline on a local PDF.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
#[cfg(feature = "ocr-ocrs")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "ocr-ocrs")]
use report_analyzer::ExtractProgress;
use report_analyzer::{
    filename, report, AnalysisRequest, Analyzer, AnalyzerConfig, ProxyClient,
    DEFAULT_PROMPT_TEMPLATE,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
#[cfg(feature = "ocr-ocrs")]
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the same-origin proxy (reads config.local.toml / config.toml, env)
  report-analyzer serve

  # Analyze a pasted report against a running proxy
  report-analyzer analyze --report q3.txt -o analysis.html

  # Analyze with a custom prompt template (must contain {{COMPANY_REPORT}})
  report-analyzer analyze --report q3.txt --prompt prompt.txt

  # Extract text from a PDF with OCR (build with --features ocr-ocrs)
  report-analyzer extract statement.pdf -o statement.txt

ENVIRONMENT VARIABLES:
  CLAUDE_API_KEY / ANTHROPIC_API_KEY   Upstream API credential (serve)
  PORT                                 Proxy listen port
  REPORT_ANALYZER_MODEL                Upstream model identifier
  REPORT_ANALYZER_ENDPOINT             Proxy base URL (analyze)
  REPORT_ANALYZER_OCRS_MODELS          Directory with the two .rten models (extract)
"#;

/// Analyze company reports with a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "report-analyzer",
    version,
    about = "Analyze company reports with a hosted LLM",
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the same-origin proxy server.
    Serve {
        /// Listen port (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a report file through a running proxy.
    Analyze {
        /// Report text file to analyze.
        #[arg(short, long)]
        report: PathBuf,

        /// Prompt template file; defaults to the built-in template.
        #[arg(short = 't', long)]
        prompt: Option<PathBuf>,

        /// Output HTML file; defaults to `<company>-Report-<date>.html`
        /// in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Proxy base URL (overrides config).
        #[arg(long, env = "REPORT_ANALYZER_ENDPOINT")]
        endpoint: Option<String>,

        /// Print the structured outcome as JSON instead of writing HTML.
        #[arg(long)]
        json: bool,
    },

    /// Extract text from a PDF with per-page OCR.
    Extract {
        /// Input PDF.
        pdf: PathBuf,

        /// Output text file; defaults to `<pdf stem>.txt` next to the PDF.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory containing text-detection.rten and
        /// text-recognition.rten.
        #[arg(long, env = "REPORT_ANALYZER_OCRS_MODELS", default_value = "models")]
        models: PathBuf,

        /// Disable the progress bar.
        #[arg(long)]
        no_progress: bool,
    },
}

// ── Terminal progress sink ───────────────────────────────────────────────

/// Renders the extraction as a per-page progress bar with a recognition
/// percentage in the message slot.
#[cfg(feature = "ocr-ocrs")]
struct CliExtractProgress {
    bar: ProgressBar,
}

#[cfg(feature = "ocr-ocrs")]
impl CliExtractProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold} [{bar:40.green/238}] {pos}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

#[cfg(feature = "ocr-ocrs")]
impl ExtractProgress for CliExtractProgress {
    fn on_extract_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
    }

    fn on_page_render(&self, page: usize, _total: usize) {
        self.bar.set_message(format!("rendering page {page}"));
    }

    fn on_recognition_progress(&self, page: usize, fraction: f32) {
        self.bar
            .set_message(format!("OCR page {page}… {}%", (fraction * 100.0).round()));
    }

    fn on_page_complete(&self, _page: usize, _total: usize, _text_len: usize) {
        self.bar.inc(1);
    }

    fn on_extract_complete(&self, total_pages: usize) {
        self.bar
            .finish_with_message(format!("{total_pages} pages done"));
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { port } => run_serve(port).await,
        Command::Analyze {
            report,
            prompt,
            output,
            endpoint,
            json,
        } => run_analyze(report, prompt, output, endpoint, json, cli.quiet).await,
        Command::Extract {
            pdf,
            output,
            models,
            no_progress,
        } => run_extract(pdf, output, models, no_progress || cli.quiet).await,
    }
}

async fn run_serve(port: Option<u16>) -> Result<()> {
    let mut config = AnalyzerConfig::load();
    if let Some(p) = port {
        config.port = p;
    }
    report_analyzer::server::serve(config)
        .await
        .context("Proxy server failed")
}

async fn run_analyze(
    report_path: PathBuf,
    prompt_path: Option<PathBuf>,
    output: Option<PathBuf>,
    endpoint: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let report_text = tokio::fs::read_to_string(&report_path)
        .await
        .with_context(|| format!("Failed to read report from {}", report_path.display()))?;

    let prompt_template = match prompt_path {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read prompt from {}", path.display()))?,
        None => DEFAULT_PROMPT_TEMPLATE.to_string(),
    };

    let mut config = AnalyzerConfig::load();
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }

    let analyzer = Analyzer::new(Arc::new(ProxyClient::from_config(&config)));
    let request = AnalysisRequest::new(prompt_template, report_text.clone());
    let outcome = analyzer
        .analyze(&request)
        .await
        .context("Analysis failed")?;

    if json {
        let serialized =
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?;
        println!("{serialized}");
        return Ok(());
    }

    let company = filename::derive_company_name(&outcome.html, &report_text);
    let out_path = output.unwrap_or_else(|| PathBuf::from(filename::report_filename_today(&company)));
    let document = report::wrap_analysis_document(&outcome.html);

    let dir = out_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let name = out_path
        .file_name()
        .context("Output path has no file name")?
        .to_string_lossy()
        .into_owned();
    let written = report::save_atomic(dir, &name, &document)
        .await
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    if !quiet {
        eprintln!(
            "Saved analysis ({} section(s)) to {}",
            outcome.body.section_count(),
            written.display()
        );
    }
    Ok(())
}

#[cfg(feature = "ocr-ocrs")]
async fn run_extract(
    pdf: PathBuf,
    output: Option<PathBuf>,
    models: PathBuf,
    no_progress: bool,
) -> Result<()> {
    use report_analyzer::ocr::{OcrsEngine, PdfiumRasterizer, TextExtractor};

    let engine = OcrsEngine::from_model_dir(&models)
        .with_context(|| format!("Failed to load OCR models from {}", models.display()))?;

    let mut extractor = TextExtractor::new(Arc::new(PdfiumRasterizer::new()), Arc::new(engine));
    if !no_progress {
        extractor = extractor.with_progress(CliExtractProgress::new());
    }

    let extracted = extractor
        .extract(&pdf)
        .await
        .context("Extraction failed")?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &extracted.text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Extracted {} page(s) to {}",
                extracted.page_count,
                path.display()
            );
        }
        None => {
            let stem = pdf
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "extracted_text".to_string());
            let dir = pdf
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let written = report::save_text_file(dir, &stem, &extracted.text)
                .await
                .context("Failed to save extracted text")?;
            eprintln!(
                "Extracted {} page(s) to {}",
                extracted.page_count,
                written.display()
            );
        }
    }

    Ok(())
}

#[cfg(not(feature = "ocr-ocrs"))]
async fn run_extract(
    _pdf: PathBuf,
    _output: Option<PathBuf>,
    _models: PathBuf,
    _no_progress: bool,
) -> Result<()> {
    anyhow::bail!(
        "This build has no OCR engine. Reinstall with:\n  cargo install report-analyzer --features ocr-ocrs"
    );
}
