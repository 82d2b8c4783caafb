// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI provider implementation.
//!
//! Serves GPT models through the Chat Completions API. Any endpoint speaking
//! the same protocol works by overriding the base URL.
//!
//! # API Reference
//!
//! See [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing::debug;

use super::{build_client, estimate_tokens, execute_call, Completion, StatsRecorder};
use crate::error::ProviderError;
use crate::types::{ModelConfig, ModelResponse, Provider, ProviderStats, TaskRequest};

/// OpenAI chat-completions provider for one model.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    config: ModelConfig,
    stats: StatsRecorder,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider. `base_url` includes the `/v1` segment.
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

    fn build_request(&self, request: &TaskRequest) -> ChatRequest {
        ChatRequest {
            model: self.config.backend_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.content.clone(),
            }],
            max_tokens: request.effective_max_tokens(&self.config),
            temperature: request.temperature,
        }
    }

    async fn complete(&self, request: &TaskRequest) -> Result<Completion, ProviderError> {
        let body = self.build_request(request);

        #[cfg(feature = "telemetry")]
        debug!(model = %self.config.backend_model, max_tokens = body.max_tokens, "Sending chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(handle_error_response(status.as_u16(), &error_text));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        api_response.into_completion()
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn generate(&self, request: &TaskRequest) -> ModelResponse {
        execute_call(&self.config, &self.stats, request, self.complete(request)).await
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .send()
            .await;

        match result {
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
        "OpenAI"
    }
}

/// Map an error response from the API to a [`ProviderError`].
fn handle_error_response(status_code: u16, body: &str) -> ProviderError {
    if let Ok(error) = serde_json::from_str::<ApiError>(body) {
        let message = error.error.message;
        match (error.error.error_type.as_deref(), error.error.code.as_deref()) {
            (Some("authentication_error"), _) | (_, Some("invalid_api_key")) => {
                ProviderError::AuthError(message)
            }
            (Some("rate_limit_error"), _) | (_, Some("rate_limit_exceeded")) => {
                ProviderError::RateLimited(message)
            }
            (_, Some("model_not_found")) => ProviderError::ModelNotFound(message),
            _ if status_code == 401 => ProviderError::AuthError(message),
            _ if status_code == 429 => ProviderError::RateLimited(message),
            _ => ProviderError::api(message, status_code),
        }
    } else {
        ProviderError::api(body.to_string(), status_code)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))?;
        let content = choice.message.content.unwrap_or_default();
        let tokens = match self.usage {
            Some(usage) => usage.total_tokens,
            None => estimate_tokens(&content),
        };
        Ok(Completion { content, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{model_config, UNREACHABLE};
    use crate::types::ModelId;
    use std::time::Duration;

    fn provider(base_url: &str) -> OpenAIProvider {
        OpenAIProvider::new(model_config(ModelId::Gpt4o, 0.00001), "test-key", base_url).unwrap()
    }

    #[test]
    fn test_openai_provider_creation() {
        let provider = provider("https://api.openai.com/v1");
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model_id(), ModelId::Gpt4o);
    }

    #[test]
    fn test_request_uses_model_default_max_tokens() {
        let provider = provider("https://api.openai.com/v1");
        let body = provider.build_request(&TaskRequest::new("Hi").with_temperature(0.1));
        assert_eq!(body.max_tokens, 1024);
        assert_eq!(body.model, "gpt-4o");

        let body = provider.build_request(&TaskRequest::new("Hi").with_max_tokens(32));
        assert_eq!(body.max_tokens, 32);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.content, "Hi there");
        assert_eq!(completion.tokens, 8);
    }

    #[test]
    fn test_response_without_choices_is_parse_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.into_completion(), Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_error_classification() {
        let auth = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert!(matches!(handle_error_response(401, auth), ProviderError::AuthError(_)));

        let rate = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        assert!(matches!(handle_error_response(429, rate), ProviderError::RateLimited(_)));

        let missing = r#"{"error":{"message":"The model gpt-99 does not exist","type":"invalid_request_error","code":"model_not_found"}}"#;
        match handle_error_response(404, missing) {
            ProviderError::ModelNotFound(message) => assert!(message.contains("gpt-99")),
            other => panic!("Expected ModelNotFound, got {other:?}"),
        }

        let server = r#"{"error":{"message":"boom","type":"server_error"}}"#;
        assert!(matches!(
            handle_error_response(500, server),
            ProviderError::ApiError { status_code: Some(500), .. }
        ));
    }

    #[tokio::test]
    async fn test_generate_unreachable_backend_fails_cleanly() {
        let provider = provider(UNREACHABLE);
        let response = provider
            .generate(&TaskRequest::new("hello").with_timeout(Duration::from_secs(5)))
            .await;
        assert!(!response.success);
        assert_eq!(response.cost, 0.0);
        assert_eq!(provider.stats().failed_requests, 1);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let provider = provider(UNREACHABLE);
        assert!(!provider.health_check().await);
        assert_eq!(provider.stats().requests, 0);
    }
}
