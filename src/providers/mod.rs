// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model backend implementations for switchyard.
//!
//! This module provides implementations of the [`Provider`] trait for the
//! supported backends:
//!
//! - [`anthropic::AnthropicProvider`] - Claude models via the Anthropic Messages API
//! - [`openai::OpenAIProvider`] - GPT models via the OpenAI Chat Completions API
//! - [`ollama::OllamaProvider`] - local models via an Ollama server
//!
//! Each provider serves exactly one [`ModelConfig`]. All of them route their
//! backend call through [`execute_call`], which owns timing, timeout
//! enforcement, cost, normalization of failures and stats bookkeeping.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard::orchestrator::catalog;
//! use switchyard::providers::{create_provider, BackendConfig, ProviderSlot};
//! use switchyard::types::ModelId;
//!
//! let backend = BackendConfig::with_api_key("sk-...");
//! match create_provider(catalog::model_config(ModelId::Gpt4o), &backend) {
//!     ProviderSlot::Ready(provider) => { /* use it */ }
//!     ProviderSlot::Absent { reason } => eprintln!("skipped: {reason}"),
//! }
//! ```

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod stats;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use stats::StatsRecorder;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{ModelConfig, ModelResponse, ProviderKind, SharedProvider, TaskRequest};

/// Connect timeout for backend HTTP clients.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Words-to-tokens ratio used by [`estimate_tokens`].
const TOKENS_PER_WORD: f64 = 1.3;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Connection settings shared by every model of one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// API key; required by hosted backends
    pub api_key: Option<String>,
    /// Base URL override; the backend default is used when unset
    pub base_url: Option<String>,
    /// Whether the backend should be constructed at all
    pub enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            enabled: true,
        }
    }
}

impl BackendConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Resolve the base URL for a model: per-model endpoint, then backend
/// override, then the backend default.
pub fn resolve_base_url(config: &ModelConfig, backend: &BackendConfig) -> String {
    config
        .endpoint
        .as_deref()
        .or(backend.base_url.as_deref())
        .unwrap_or_else(|| config.provider.default_base_url())
        .trim_end_matches('/')
        .to_string()
}

// ============================================================================
// Factory
// ============================================================================

/// Outcome of constructing the provider for one model.
#[derive(Clone)]
pub enum ProviderSlot {
    /// Provider constructed and ready to serve
    Ready(SharedProvider),
    /// Provider deliberately not constructed
    Absent { reason: String },
}

impl ProviderSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(provider) => f
                .debug_tuple("Ready")
                .field(&provider.model_id())
                .finish(),
            Self::Absent { reason } => f.debug_struct("Absent").field("reason", reason).finish(),
        }
    }
}

/// Create the provider serving `config`.
///
/// A hosted backend without an API key, a disabled backend, or an HTTP client
/// that cannot be built yields [`ProviderSlot::Absent`]. Absence is not an
/// error: the orchestrator simply never routes to that model.
pub fn create_provider(config: ModelConfig, backend: &BackendConfig) -> ProviderSlot {
    let id = config.id;
    match try_create_provider(config, backend) {
        Ok(provider) => ProviderSlot::Ready(provider),
        Err(err) => {
            let reason = match err {
                ProviderError::NotConfigured(reason) => reason,
                other => other.to_string(),
            };
            debug!(model = %id, %reason, "Provider not constructed");
            ProviderSlot::Absent { reason }
        }
    }
}

fn try_create_provider(
    config: ModelConfig,
    backend: &BackendConfig,
) -> Result<SharedProvider, ProviderError> {
    let kind = config.provider;
    if !backend.enabled {
        return Err(ProviderError::NotConfigured(format!("{} backend disabled", kind)));
    }

    let base_url = resolve_base_url(&config, backend);
    match kind {
        ProviderKind::Anthropic => {
            let api_key = require_api_key(kind, backend)?;
            Ok(Arc::new(AnthropicProvider::new(config, api_key, base_url)?))
        }
        ProviderKind::OpenAI => {
            let api_key = require_api_key(kind, backend)?;
            Ok(Arc::new(OpenAIProvider::new(config, api_key, base_url)?))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config, base_url)?)),
    }
}

fn require_api_key(kind: ProviderKind, backend: &BackendConfig) -> Result<String, ProviderError> {
    backend
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ProviderError::NotConfigured(format!("API key required for {}", kind)))
}

/// Build the HTTP client used by a provider.
///
/// No overall request timeout: `execute_call` bounds each call by the
/// request's own deadline, however long that is.
pub(crate) fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("failed to build HTTP client: {}", e)))
}

// ============================================================================
// Shared Call Path
// ============================================================================

/// Raw result of one successful backend exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub tokens: u32,
}

/// Approximate token count: `round(words * 1.3)`.
///
/// This is a heuristic for backends that report no usage; it is not a
/// tokenizer and will drift from real counts, especially for code.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count() as f64;
    (words * TOKENS_PER_WORD).round() as u32
}

/// Cost of `tokens` on `config`. Local backends are always free.
pub fn compute_cost(config: &ModelConfig, tokens: u32) -> f64 {
    if config.provider.is_metered() {
        f64::from(tokens) * config.cost_per_token
    } else {
        0.0
    }
}

/// Run one backend call and turn its outcome into a [`ModelResponse`].
///
/// The call is bounded by `request.timeout`; on expiry the in-flight future is
/// dropped and the response reports a timeout. Failures carry zero tokens and
/// zero cost. The response is recorded into `stats` exactly once.
pub async fn execute_call<F>(
    config: &ModelConfig,
    stats: &StatsRecorder,
    request: &TaskRequest,
    call: F,
) -> ModelResponse
where
    F: Future<Output = Result<Completion, ProviderError>>,
{
    let start = Instant::now();

    #[cfg(feature = "telemetry")]
    debug!(
        model = %config.id,
        request_id = %request.id,
        task_type = %request.task_type,
        "Sending generate request"
    );

    let outcome = match tokio::time::timeout(request.timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(request.timeout.as_millis() as u64)),
    };
    let elapsed = start.elapsed();

    let response = match outcome {
        Ok(completion) => {
            let cost = compute_cost(config, completion.tokens);
            ModelResponse::success(
                request.id.clone(),
                config.id,
                completion.content,
                completion.tokens,
                cost,
                elapsed,
            )
        }
        Err(err) => ModelResponse::failure(request.id.clone(), config.id, err.to_string(), elapsed),
    };

    #[cfg(feature = "telemetry")]
    debug!(
        model = %config.id,
        request_id = %request.id,
        success = response.success,
        tokens = response.tokens_used,
        elapsed_ms = elapsed.as_millis() as u64,
        error = response.error.as_deref().unwrap_or(""),
        "Generate finished"
    );

    stats.record(&response);
    response
}


#[cfg(test)]
mod tests {
    use super::test_support::model_config;
    use super::*;
    use crate::types::ModelId;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   "), 0);
        assert_eq!(estimate_tokens("hello"), 1);
        assert_eq!(estimate_tokens("one two three four five six seven eight nine ten"), 13);
        assert_eq!(estimate_tokens("a  b\n\tc"), 4);
    }

    #[test]
    fn test_compute_cost() {
        let hosted = model_config(ModelId::Gpt4o, 0.00001);
        assert!((compute_cost(&hosted, 1000) - 0.01).abs() < 1e-12);

        // Local backends never cost anything, whatever the table says.
        let local = model_config(ModelId::OllamaLlama, 0.5);
        assert_eq!(compute_cost(&local, 1000), 0.0);
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        let mut config = model_config(ModelId::Gpt4o, 0.0);
        let backend = BackendConfig::default();
        assert_eq!(resolve_base_url(&config, &backend), "https://api.openai.com/v1");

        let backend = BackendConfig::default().with_base_url("http://proxy:8080/v1/");
        assert_eq!(resolve_base_url(&config, &backend), "http://proxy:8080/v1");

        config.endpoint = Some("http://direct:9000".to_string());
        assert_eq!(resolve_base_url(&config, &backend), "http://direct:9000");
    }

    #[test]
    fn test_create_provider_missing_key_is_absent() {
        let slot = create_provider(model_config(ModelId::ClaudeOpus, 0.0), &BackendConfig::default());
        match slot {
            ProviderSlot::Absent { reason } => assert!(reason.contains("Anthropic")),
            ProviderSlot::Ready(_) => panic!("Expected Absent"),
        }

        let blank = BackendConfig::with_api_key("  ");
        assert!(!create_provider(model_config(ModelId::Gpt4o, 0.0), &blank).is_ready());
    }

    #[test]
    fn test_create_provider_disabled_is_absent() {
        let slot = create_provider(model_config(ModelId::OllamaLlama, 0.0), &BackendConfig::disabled());
        assert!(matches!(slot, ProviderSlot::Absent { .. }));
    }

    #[test]
    fn test_create_provider_ready() {
        let slot = create_provider(
            model_config(ModelId::ClaudeHaiku, 0.0),
            &BackendConfig::with_api_key("test-key"),
        );
        match slot {
            ProviderSlot::Ready(provider) => {
                assert_eq!(provider.name(), "Anthropic");
                assert_eq!(provider.model_id(), ModelId::ClaudeHaiku);
            }
            ProviderSlot::Absent { reason } => panic!("unexpected absence: {reason}"),
        }

        // Ollama needs no key.
        let slot = create_provider(model_config(ModelId::OllamaMistral, 0.0), &BackendConfig::default());
        assert!(slot.is_ready());
    }

    #[tokio::test]
    async fn test_execute_call_success() {
        let config = model_config(ModelId::Gpt4oMini, 0.001);
        let stats = StatsRecorder::new();
        let request = TaskRequest::new("hi").with_id("req-1");

        let response = execute_call(&config, &stats, &request, async {
            Ok(Completion {
                content: "hello".to_string(),
                tokens: 10,
            })
        })
        .await;

        assert!(response.success);
        assert_eq!(response.request_id, "req-1");
        assert_eq!(response.model, ModelId::Gpt4oMini);
        assert_eq!(response.tokens_used, 10);
        assert!((response.cost - 0.01).abs() < 1e-12);
        assert_eq!(stats.snapshot().successful_requests, 1);
    }

    #[tokio::test]
    async fn test_execute_call_failure_is_free() {
        let config = model_config(ModelId::Gpt4o, 0.001);
        let stats = StatsRecorder::new();
        let request = TaskRequest::new("hi");

        let response = execute_call(&config, &stats, &request, async {
            Err(ProviderError::RateLimited("slow down".to_string()))
        })
        .await;

        assert!(!response.success);
        assert_eq!(response.tokens_used, 0);
        assert_eq!(response.cost, 0.0);
        assert!(response.error.unwrap().contains("slow down"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
        assert!(snapshot.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_call_timeout() {
        let config = model_config(ModelId::ClaudeSonnet, 0.001);
        let stats = StatsRecorder::new();
        let request = TaskRequest::new("hi").with_timeout(Duration::from_millis(50));

        let response = execute_call(&config, &stats, &request, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Completion {
                content: "too late".to_string(),
                tokens: 1,
            })
        })
        .await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Timeout after 50ms"));
        assert_eq!(stats.snapshot().failed_requests, 1);
    }
}
