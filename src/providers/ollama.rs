// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ollama local inference provider.
//!
//! Talks to the native `/api/generate` endpoint with streaming disabled. Local
//! inference is never billed, and token counts are always estimated from the
//! generated text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing::debug;

use super::{build_client, estimate_tokens, execute_call, Completion, StatsRecorder};
use crate::error::ProviderError;
use crate::types::{ModelConfig, ModelResponse, Provider, ProviderStats, TaskRequest};

/// Ollama provider for one local model.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    config: ModelConfig,
    stats: StatsRecorder,
}

impl OllamaProvider {
    pub fn new(config: ModelConfig, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            config,
            stats: StatsRecorder::new(),
        })
    }

    fn build_request(&self, request: &TaskRequest) -> GenerateRequest {
        GenerateRequest {
            model: self.config.backend_model.clone(),
            prompt: request.content.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.effective_max_tokens(&self.config),
            },
        }
    }

    async fn complete(&self, request: &TaskRequest) -> Result<Completion, ProviderError> {
        let body = self.build_request(request);

        #[cfg(feature = "telemetry")]
        debug!(model = %self.config.backend_model, base_url = %self.base_url, "Sending generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(handle_error_response(status.as_u16(), &error_text));
        }

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let tokens = estimate_tokens(&api_response.response);
        Ok(Completion {
            content: api_response.response,
            tokens,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(&self, request: &TaskRequest) -> ModelResponse {
        execute_call(&self.config, &self.stats, request, self.complete(request)).await
    }

    async fn health_check(&self) -> bool {
        match self.client.get(format!("{}/api/tags", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_err) => {
                #[cfg(feature = "telemetry")]
                debug!(model = %self.config.id, error = %_err, "Health check failed");
                false
            }
        }
    }

    fn stats(&self) -> ProviderStats {
        self.stats.snapshot()
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

/// Ollama reports errors as `{"error": "..."}`.
fn handle_error_response(status_code: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());
    if status_code == 404 {
        ProviderError::ModelNotFound(message)
    } else {
        ProviderError::api(message, status_code)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{model_config, UNREACHABLE};
    use crate::types::ModelId;
    use std::time::Duration;

    #[test]
    fn test_request_serialization() {
        let provider = OllamaProvider::new(model_config(ModelId::OllamaCodellama, 0.0), "http://localhost:11434").unwrap();
        let body = provider.build_request(&TaskRequest::new("fn main").with_temperature(0.3).with_max_tokens(99));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "codellama");
        assert_eq!(json["prompt"], "fn main");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 99);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            handle_error_response(404, r#"{"error":"model 'phi9' not found"}"#),
            ProviderError::ModelNotFound(m) if m.contains("phi9")
        ));
        assert!(matches!(
            handle_error_response(500, "oops"),
            ProviderError::ApiError { status_code: Some(500), .. }
        ));
    }

    #[tokio::test]
    async fn test_generate_unreachable_is_free_failure() {
        // A price in the table must not leak into local-backend responses.
        let provider = OllamaProvider::new(model_config(ModelId::OllamaLlama, 1.0), UNREACHABLE).unwrap();
        let response = provider
            .generate(&TaskRequest::new("hello").with_timeout(Duration::from_secs(5)))
            .await;
        assert!(!response.success);
        assert_eq!(response.cost, 0.0);
        assert_eq!(response.model, ModelId::OllamaLlama);
        assert_eq!(provider.stats().requests, 1);
        assert!(!provider.health_check().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_request_deadline_is_honored() {
        // Accepts connections but never answers, like a model still loading.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let provider = OllamaProvider::new(model_config(ModelId::OllamaLlama, 0.0), base_url).unwrap();

        let response = provider
            .generate(&TaskRequest::new("hello").with_timeout(Duration::from_secs(600)))
            .await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Timeout after 600000ms"));
        assert_eq!(provider.stats().failed_requests, 1);
        drop(listener);
    }
}
