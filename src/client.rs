//! The model collaborator: a prompt goes in, model text comes out.
//!
//! [`ModelClient`] is the seam between the orchestrator and the network.
//! Production uses [`ProxyClient`], which talks to the same-origin proxy
//! (`POST /api/complete`, see [`crate::server`]); tests substitute canned
//! or misbehaving implementations.
//!
//! Cancellation contract: implementations race the whole request against
//! the provided token and return [`AnalysisError::Cancelled`] once it fires.
//! Dropping the in-flight reqwest future aborts the underlying connection,
//! so a cancelled request stops consuming the socket immediately.

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A collaborator that completes a text prompt into model-generated text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` and return the model's text, or fail with a transport,
    /// HTTP, or cancellation error.
    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AnalysisError>;
}

/// HTTP client for the same-origin proxy endpoint.
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ContentBody {
    content: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ProxyClient {
    /// Create a client for the proxy at `base_url` (no trailing slash
    /// required).
    pub fn new(base_url: impl Into<String>) -> Self {
        // No overall request timeout: a hung upstream hangs the pipeline
        // until the user cancels. Connect timeout still applies so a dead
        // host fails fast as a transport error.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Create a client pointed at the configured proxy endpoint.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.endpoint.clone())
    }

    fn complete_url(&self) -> String {
        format!("{}/api/complete", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelClient for ProxyClient {
    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AnalysisError> {
        let url = self.complete_url();
        debug!("Requesting completion via {}", url);

        let request = async {
            let response = self
                .http
                .post(&url)
                .json(&serde_json::json!({ "prompt": prompt }))
                .send()
                .await
                .map_err(|e| AnalysisError::Transport {
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                // Best-effort message extraction; fall back to the generic
                // status line when the body is not our error shape.
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .ok()
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| {
                        format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        )
                    });
                return Err(AnalysisError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body: ContentBody =
                response
                    .json()
                    .await
                    .map_err(|e| AnalysisError::Transport {
                        reason: e.to_string(),
                    })?;
            Ok(body.content)
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(AnalysisError::Cancelled),
            result = request => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_url_normalises_trailing_slash() {
        assert_eq!(
            ProxyClient::new("http://localhost:3000/").complete_url(),
            "http://localhost:3000/api/complete"
        );
        assert_eq!(
            ProxyClient::new("http://localhost:3000").complete_url(),
            "http://localhost:3000/api/complete"
        );
    }

    #[tokio::test]
    async fn unreachable_proxy_is_a_transport_error() {
        // Reserved TEST-NET address: connection refused/unroutable quickly.
        let client = ProxyClient::new("http://127.0.0.1:1");
        let cancel = CancellationToken::new();
        let err = client.complete("prompt", &cancel).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Transport { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let client = ProxyClient::new("http://127.0.0.1:1");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client.complete("prompt", &cancel).await.unwrap_err();
        assert!(err.is_cancelled(), "got {err:?}");
    }
}
