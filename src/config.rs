//! Configuration for the analyzer, the proxy server, and the model client.
//!
//! One struct holds every knob so configs can be logged, diffed, and shared
//! across threads. Three layers feed it, most specific last:
//!
//! 1. `config.toml` — checked-in defaults, safe to commit.
//! 2. `config.local.toml` — developer overrides, takes precedence and is the
//!    place for the real API credential.
//! 3. Environment variables — `CLAUDE_API_KEY` / `ANTHROPIC_API_KEY`,
//!    `PORT`, and the `REPORT_ANALYZER_*` family, applied on top of
//!    whichever file loaded.
//!
//! Programmatic construction goes through [`AnalyzerConfig::builder`].

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Default upstream messages endpoint.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Upstream model identifier.
    pub model: String,

    /// Token limit forwarded to the upstream API per request.
    pub max_tokens: u32,

    /// Upstream protocol version header value.
    pub api_version: String,

    /// Upstream API credential. Never serialised back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Upstream messages endpoint URL.
    pub api_url: String,

    /// Listen port for the proxy server.
    pub port: u16,

    /// Base URL the client uses to reach the proxy.
    pub endpoint: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 4000,
            api_version: "2023-06-01".to_string(),
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            port: 3000,
            endpoint: "http://localhost:3000".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from the current directory plus the environment.
    pub fn load() -> Self {
        Self::load_from(Path::new("."))
    }

    /// Load configuration from `dir`: `config.local.toml` wins over
    /// `config.toml`; missing or unparsable files fall through to defaults.
    /// Environment overrides are applied last.
    pub fn load_from(dir: &Path) -> Self {
        let mut config = ["config.local.toml", "config.toml"]
            .iter()
            .find_map(|name| {
                let path = dir.join(name);
                let contents = std::fs::read_to_string(&path).ok()?;
                match toml::from_str::<AnalyzerConfig>(&contents) {
                    Ok(parsed) => {
                        debug!("Loaded configuration from {}", path.display());
                        Some(parsed)
                    }
                    Err(e) => {
                        warn!("Ignoring unparsable config {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .unwrap_or_default();

        config.apply_env();
        config
    }

    /// Apply environment-variable overrides on top of the loaded values.
    fn apply_env(&mut self) {
        for key_var in ["CLAUDE_API_KEY", "ANTHROPIC_API_KEY"] {
            if let Ok(key) = std::env::var(key_var) {
                if !key.is_empty() {
                    self.api_key = Some(key);
                    break;
                }
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!("Ignoring non-numeric PORT value {:?}", port),
            }
        }
        if let Ok(model) = std::env::var("REPORT_ANALYZER_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
        if let Ok(endpoint) = std::env::var("REPORT_ANALYZER_ENDPOINT") {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }
    }

    /// Create a builder seeded with defaults.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_version(mut self, v: impl Into<String>) -> Self {
        self.config.api_version = v.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalysisError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(AnalysisError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.endpoint.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig("endpoint must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.max_tokens, 4000);
        assert_eq!(c.port, 3000);
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn builder_validates_max_tokens() {
        let err = AnalyzerConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn builder_sets_fields() {
        let c = AnalyzerConfig::builder()
            .model("claude-3-5-sonnet-latest")
            .max_tokens(2048)
            .port(8080)
            .api_key("sk-test")
            .build()
            .unwrap();
        assert_eq!(c.model, "claude-3-5-sonnet-latest");
        assert_eq!(c.max_tokens, 2048);
        assert_eq!(c.port, 8080);
        assert_eq!(c.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn toml_with_partial_fields_fills_defaults() {
        let parsed: AnalyzerConfig = toml::from_str("model = \"test-model\"\nport = 4000\n").unwrap();
        assert_eq!(parsed.model, "test-model");
        assert_eq!(parsed.port, 4000);
        assert_eq!(parsed.max_tokens, 4000);
    }

    #[test]
    fn local_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "model = \"base\"\n").unwrap();
        std::fs::write(dir.path().join("config.local.toml"), "model = \"local\"\n").unwrap();
        let c = AnalyzerConfig::load_from(dir.path());
        assert_eq!(c.model, "local");
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = AnalyzerConfig::load_from(dir.path());
        assert_eq!(c.max_tokens, AnalyzerConfig::default().max_tokens);
    }
}
