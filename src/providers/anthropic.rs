// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Anthropic Claude provider implementation.
//!
//! This module provides a [`Provider`] implementation for Anthropic's Claude
//! models using the non-streaming Messages API.
//!
//! # API Reference
//!
//! See [Anthropic Messages API](https://docs.anthropic.com/en/api/messages) for details.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing::debug;

use super::{build_client, estimate_tokens, execute_call, Completion, StatsRecorder};
use crate::error::ProviderError;
use crate::types::{ModelConfig, ModelResponse, Provider, ProviderStats, TaskRequest};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
///
/// Implements the [`Provider`] trait for one Claude model.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    config: ModelConfig,
    stats: StatsRecorder,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    ///
    /// # Arguments
    ///
    /// * `config` - Model this provider serves
    /// * `api_key` - Anthropic API key
    /// * `base_url` - API base URL, without the `/v1` suffix
    pub fn new(
        config: ModelConfig,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
            config,
            stats: StatsRecorder::new(),
        })
    }

    fn build_request(&self, content: &str, max_tokens: u32, temperature: Option<f32>) -> AnthropicRequest {
        AnthropicRequest {
            model: self.config.backend_model.clone(),
            max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: content.to_string(),
            }],
            temperature,
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<ApiResponse, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(handle_error_response(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn complete(&self, request: &TaskRequest) -> Result<Completion, ProviderError> {
        let body = self.build_request(
            &request.content,
            request.effective_max_tokens(&self.config),
            Some(request.temperature),
        );

        #[cfg(feature = "telemetry")]
        debug!(model = %self.config.backend_model, max_tokens = body.max_tokens, "Sending messages request");

        let api_response = self.send(&body).await?;
        Ok(api_response.into_completion())
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn generate(&self, request: &TaskRequest) -> ModelResponse {
        execute_call(&self.config, &self.stats, request, self.complete(request)).await
    }

    async fn health_check(&self) -> bool {
        // Not routed through execute_call: health checks must not count as traffic.
        let body = self.build_request("ping", 1, None);
        match self.send(&body).await {
            Ok(_) => true,
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
        "Anthropic"
    }
}

/// Map an error response from the API to a [`ProviderError`].
fn handle_error_response(status_code: u16, body: &str) -> ProviderError {
    if let Ok(error) = serde_json::from_str::<ApiError>(body) {
        match error.error.error_type.as_str() {
            "authentication_error" | "permission_error" => ProviderError::AuthError(error.error.message),
            "rate_limit_error" => ProviderError::RateLimited(error.error.message),
            "not_found_error" => ProviderError::ModelNotFound(error.error.message),
            "invalid_request_error" => {
                if error.error.message.contains("model") {
                    ProviderError::ModelNotFound(error.error.message)
                } else {
                    ProviderError::api(error.error.message, status_code)
                }
            }
            "overloaded_error" => ProviderError::RateLimited("API overloaded".to_string()),
            _ => ProviderError::api(error.error.message, status_code),
        }
    } else {
        ProviderError::api(body.to_string(), status_code)
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

/// API response format.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContentBlock>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Token usage in API format.
#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl ApiResponse {
    fn into_completion(self) -> Completion {
        let content: String = self
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let tokens = match self.usage {
            Some(usage) => usage.input_tokens.saturating_add(usage.output_tokens),
            None => estimate_tokens(&content),
        };
        Completion { content, tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{model_config, UNREACHABLE};
    use crate::types::ModelId;
    use std::time::Duration;

    fn provider(base_url: &str) -> AnthropicProvider {
        AnthropicProvider::new(model_config(ModelId::ClaudeSonnet, 0.000015), "test-key", base_url).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = provider("https://api.anthropic.com");
        assert_eq!(provider.name(), "Anthropic");
        assert_eq!(provider.model_id(), ModelId::ClaudeSonnet);
        assert_eq!(provider.stats(), ProviderStats::default());
    }

    #[test]
    fn test_request_serialization() {
        let provider = provider("https://api.anthropic.com");
        let body = provider.build_request("Hello!", 64, Some(0.5));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello!");
        assert_eq!(json["temperature"], 0.5);

        let ping = provider.build_request("ping", 1, None);
        let json = serde_json::to_value(&ping).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_tokens_from_usage() {
        let json = r#"{
            "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": " world"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 30}
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        let completion = response.into_completion();
        assert_eq!(completion.content, "Hello world");
        assert_eq!(completion.tokens, 42);
    }

    #[test]
    fn test_response_tokens_saturate_on_huge_usage() {
        let json = r#"{
            "content": [{"type": "text", "text": "ok"}],
            "usage": {"input_tokens": 4294967295, "output_tokens": 1}
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_completion().tokens, u32::MAX);
    }

    #[test]
    fn test_response_tokens_estimated_without_usage() {
        let json = r#"{"content": [{"type": "text", "text": "one two three four five six seven eight nine ten"}]}"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_completion().tokens, 13);
    }

    #[test]
    fn test_error_classification() {
        let auth = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert!(matches!(handle_error_response(401, auth), ProviderError::AuthError(_)));

        let rate = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert!(matches!(handle_error_response(429, rate), ProviderError::RateLimited(_)));

        let overloaded = r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#;
        assert!(matches!(handle_error_response(529, overloaded), ProviderError::RateLimited(_)));

        let model = r#"{"type":"error","error":{"type":"invalid_request_error","message":"model: claude-9 not found"}}"#;
        assert!(matches!(handle_error_response(400, model), ProviderError::ModelNotFound(_)));

        match handle_error_response(502, "<html>bad gateway</html>") {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, Some(502));
                assert!(message.contains("bad gateway"));
            }
            other => panic!("Expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_unreachable_backend_fails_cleanly() {
        let provider = provider(UNREACHABLE);
        let request = TaskRequest::new("hello").with_timeout(Duration::from_secs(5));

        let response = provider.generate(&request).await;
        assert!(!response.success);
        assert_eq!(response.tokens_used, 0);
        assert_eq!(response.cost, 0.0);
        assert!(response.error.is_some());

        let stats = provider.stats();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_health_check_does_not_touch_stats() {
        let provider = provider(UNREACHABLE);
        assert!(!provider.health_check().await);
        assert_eq!(provider.stats().requests, 0);
    }
}
