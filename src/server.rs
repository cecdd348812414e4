//! The same-origin proxy server.
//!
//! Two endpoints:
//!
//! * `POST /api/complete` — `{"prompt": "..."}` in, `{"content": "..."}`
//!   out. Forwards to the configured upstream messages API with the model,
//!   token limit, protocol version, and credential from [`AnalyzerConfig`].
//!   Non-success upstream responses are remapped: 529 becomes a
//!   service-overloaded message, 429 a rate-limited message, anything else
//!   the best-effort extracted message or the generic status line — all
//!   re-emitted under the upstream status code.
//!
//! * `POST /api/download-html` — `{"analysisContent": "<fragment>"}` in,
//!   a complete styled HTML document out as an attachment.
//!
//! CORS is permissive: the proxy exists so a browser page can reach the
//! upstream without exposing the credential, not to gate callers.

use crate::config::AnalyzerConfig;
use crate::report;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const OVERLOADED_MESSAGE: &str =
    "The analysis service is currently overloaded. Please try again in a few minutes.";
const RATE_LIMITED_MESSAGE: &str =
    "Rate limit exceeded. Please wait a moment before trying again.";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AnalyzerConfig>,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

/// Build the proxy router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/complete", post(complete))
        .route("/api/download-html", post(download_html))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and run the proxy on the configured port.
pub async fn serve(config: AnalyzerConfig) -> std::io::Result<()> {
    let port = config.port;
    let app = router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Proxy listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

// ── /api/complete ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CompleteRequest {
    prompt: Option<String>,
}

#[derive(Serialize)]
struct UpstreamRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<UpstreamMessage>,
}

#[derive(Serialize)]
struct UpstreamMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct UpstreamResponse {
    content: Vec<UpstreamContent>,
}

#[derive(Deserialize)]
struct UpstreamContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn complete(
    State(state): State<AppState>,
    body: Option<Json<CompleteRequest>>,
) -> Response {
    // A malformed body and a body without a prompt get the same answer.
    let prompt = body
        .and_then(|Json(b)| b.prompt)
        .filter(|p| !p.trim().is_empty());
    let Some(prompt) = prompt else {
        return error_json(StatusCode::BAD_REQUEST, "Prompt is required");
    };

    let Some(api_key) = state.config.api_key.clone() else {
        error!("Upstream API key is not configured");
        return error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "The analysis service is not configured with an API credential.",
        );
    };

    let request = UpstreamRequest {
        model: state.config.model.clone(),
        max_tokens: state.config.max_tokens,
        messages: vec![UpstreamMessage {
            role: "user",
            content: prompt,
        }],
    };

    let upstream = state
        .http
        .post(&state.config.api_url)
        .header("content-type", "application/json")
        .header("x-api-key", api_key)
        .header("anthropic-version", state.config.api_version.as_str())
        .json(&request)
        .send()
        .await;

    let response = match upstream {
        Ok(r) => r,
        Err(e) => {
            error!("Upstream request failed: {e}");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let extracted = serde_json::from_slice::<UpstreamErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.map(|d| d.message).or(b.message));
        let message = match status.as_u16() {
            529 => OVERLOADED_MESSAGE.to_string(),
            429 => RATE_LIMITED_MESSAGE.to_string(),
            code => extracted.unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    code,
                    status.canonical_reason().unwrap_or("Unknown")
                )
            }),
        };
        warn!("Upstream returned {}: {}", status.as_u16(), message);
        let passthrough =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return error_json(passthrough, message);
    }

    match response.json::<UpstreamResponse>().await {
        Ok(parsed) => {
            let content = parsed
                .content
                .first()
                .map(|c| c.text.clone())
                .unwrap_or_default();
            Json(json!({ "content": content })).into_response()
        }
        Err(e) => {
            error!("Upstream response was not the expected shape: {e}");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ── /api/download-html ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct DownloadRequest {
    #[serde(rename = "analysisContent")]
    analysis_content: Option<String>,
}

async fn download_html(body: Option<Json<DownloadRequest>>) -> Response {
    let content = body
        .and_then(|Json(b)| b.analysis_content)
        .filter(|c| !c.trim().is_empty());
    let Some(content) = content else {
        return error_json(StatusCode::BAD_REQUEST, "Analysis content is required");
    };

    let document = report::wrap_analysis_document(&content);
    let filename = report::download_filename();

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/html; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        document,
    )
        .into_response()
}
