//! Analysis orchestration: validate → substitute → request → parse → render.
//!
//! [`Analyzer`] is a small state machine. The success path is
//! `Idle → Validating → Requesting → Rendering → Idle`; every failure or
//! cancellation path snaps straight back to `Idle` so the user can retry
//! immediately. One instance allows one request in flight: a second call
//! while running fails fast with [`AnalysisError::InFlight`] — requests are
//! never queued, and callers drive their trigger control from
//! [`Analyzer::is_running`].
//!
//! ## Cancellation
//!
//! [`Analyzer::cancel`] fires the request's [`CancellationToken`]. The
//! client races its HTTP future against that token (aborting the transfer),
//! and the orchestrator re-checks the *same token* after the client
//! returns — so a response that slips in between "cancel" and "client
//! returned" is discarded rather than rendered. Cancellation is cooperative
//! only; work between checkpoints runs to completion.

use crate::client::ModelClient;
use crate::error::AnalysisError;
use crate::parse::{parse_response, AnalysisBody};
use crate::prompts::{fill_template, REPORT_PLACEHOLDER};
use crate::render::render_analysis;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A validated unit of work for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Prompt template; must contain [`REPORT_PLACEHOLDER`].
    pub prompt_template: String,
    /// The report text substituted into the template.
    pub report_text: String,
}

impl AnalysisRequest {
    pub fn new(prompt_template: impl Into<String>, report_text: impl Into<String>) -> Self {
        Self {
            prompt_template: prompt_template.into(),
            report_text: report_text.into(),
        }
    }

    /// Check the three invariants, each with its own error so the UI can
    /// point at the offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.prompt_template.trim().is_empty() {
            return Err(AnalysisError::EmptyPrompt);
        }
        if self.report_text.trim().is_empty() {
            return Err(AnalysisError::EmptyReport);
        }
        if !self.prompt_template.contains(REPORT_PLACEHOLDER) {
            return Err(AnalysisError::MissingPlaceholder);
        }
        Ok(())
    }

    /// The final prompt: template with the report substituted in.
    pub fn final_prompt(&self) -> String {
        fill_template(self.prompt_template.trim(), self.report_text.trim())
    }
}

/// Observable phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Idle,
    Validating,
    Requesting,
    Rendering,
}

/// The result of a completed analysis. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// Parsed body: named sections, or the raw fallback.
    pub body: AnalysisBody,
    /// Rendered HTML fragment.
    pub html: String,
    /// True on every successful outcome; failures and cancellations never
    /// produce an outcome, so download stays unavailable for them.
    pub download_ready: bool,
}

/// The analysis orchestrator.
pub struct Analyzer {
    client: Arc<dyn ModelClient>,
    phase: Mutex<AnalysisPhase>,
    in_flight: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Analyzer {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            phase: Mutex::new(AnalysisPhase::Idle),
            in_flight: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Current phase, for UIs that mirror the state machine.
    pub fn phase(&self) -> AnalysisPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    /// True while a request is in flight. Callers should disable whatever
    /// triggers [`Analyzer::analyze`] while this is true.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request cancellation of the in-flight analysis, if any. Cooperative:
    /// the pipeline notices at its next checkpoint.
    pub fn cancel(&self) {
        if let Some(token) = self.cancel.lock().expect("cancel lock poisoned").as_ref() {
            info!("Analysis cancellation requested");
            token.cancel();
        }
    }

    fn set_phase(&self, phase: AnalysisPhase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }

    /// Run one analysis end to end.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AnalysisError::InFlight);
        }
        // Reset to Idle and release the guard on every exit path.
        let _reset = FlightReset { analyzer: self };

        self.set_phase(AnalysisPhase::Validating);
        request.validate()?;

        let token = CancellationToken::new();
        *self.cancel.lock().expect("cancel lock poisoned") = Some(token.clone());

        self.set_phase(AnalysisPhase::Requesting);
        let prompt = request.final_prompt();
        debug!("Sending prompt ({} chars)", prompt.len());

        let response = self.client.complete(&prompt, &token).await?;

        // The client may have returned a response that raced the cancel
        // signal; the same token decides, not a separate flag.
        if token.is_cancelled() {
            info!("Discarding response that arrived after cancellation");
            return Err(AnalysisError::Cancelled);
        }

        self.set_phase(AnalysisPhase::Rendering);
        let body = parse_response(&response);
        let html = render_analysis(&body);
        info!(
            "Analysis complete: {} section(s), {} bytes of HTML",
            body.section_count(),
            html.len()
        );

        Ok(AnalysisOutcome {
            body,
            html,
            download_ready: true,
        })
    }
}

/// Drop guard: returns the orchestrator to `Idle` and releases the
/// single-flight slot no matter how `analyze` exits.
struct FlightReset<'a> {
    analyzer: &'a Analyzer,
}

impl Drop for FlightReset<'_> {
    fn drop(&mut self) {
        *self
            .analyzer
            .cancel
            .lock()
            .expect("cancel lock poisoned") = None;
        self.analyzer.set_phase(AnalysisPhase::Idle);
        self.analyzer.in_flight.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedClient(String);

    #[async_trait]
    impl ModelClient for CannedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, AnalysisError> {
            Ok(self.0.clone())
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            "Analyze: {{COMPANY_REPORT}}",
            "Acme Corp announced record revenue.",
        )
    }

    #[test]
    fn validation_errors_are_distinct() {
        let empty_prompt = AnalysisRequest::new("", "report");
        assert!(matches!(
            empty_prompt.validate(),
            Err(AnalysisError::EmptyPrompt)
        ));

        let empty_report = AnalysisRequest::new("p {{COMPANY_REPORT}}", "  ");
        assert!(matches!(
            empty_report.validate(),
            Err(AnalysisError::EmptyReport)
        ));

        // A non-empty prompt without the placeholder must get the
        // placeholder-specific error, never the empty-prompt one.
        let no_placeholder = AnalysisRequest::new("analyze this", "report");
        assert!(matches!(
            no_placeholder.validate(),
            Err(AnalysisError::MissingPlaceholder)
        ));
    }

    #[test]
    fn final_prompt_substitutes_the_report() {
        assert_eq!(
            request().final_prompt(),
            "Analyze: Acme Corp announced record revenue."
        );
    }

    #[tokio::test]
    async fn successful_analysis_renders_and_enables_download() {
        let client = Arc::new(CannedClient(
            "<executive_summary>Strong quarter.</executive_summary>".into(),
        ));
        let analyzer = Analyzer::new(client);
        let outcome = analyzer.analyze(&request()).await.unwrap();
        assert!(outcome.download_ready);
        assert!(outcome.html.contains("Executive Summary"));
        assert!(outcome.html.contains("Strong quarter."));
        assert_eq!(analyzer.phase(), AnalysisPhase::Idle);
        assert!(!analyzer.is_running());
    }

    #[tokio::test]
    async fn untagged_response_falls_back_to_raw_and_still_downloads() {
        let client = Arc::new(CannedClient("No tags in sight.".into()));
        let analyzer = Analyzer::new(client);
        let outcome = analyzer.analyze(&request()).await.unwrap();
        assert!(matches!(outcome.body, AnalysisBody::Raw(_)));
        assert!(outcome.download_ready);
        assert!(outcome.html.contains("Analysis Results"));
    }

    #[tokio::test]
    async fn validation_failure_restores_idle() {
        let analyzer = Analyzer::new(Arc::new(CannedClient(String::new())));
        let bad = AnalysisRequest::new("no placeholder", "report");
        let err = analyzer.analyze(&bad).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingPlaceholder));
        assert_eq!(analyzer.phase(), AnalysisPhase::Idle);
        assert!(!analyzer.is_running());
    }

    #[tokio::test]
    async fn cancel_without_inflight_request_is_a_no_op() {
        let analyzer = Analyzer::new(Arc::new(CannedClient("x".into())));
        analyzer.cancel();
        assert_eq!(analyzer.phase(), AnalysisPhase::Idle);
    }
}
