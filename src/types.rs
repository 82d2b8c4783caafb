// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core types for switchyard.
//!
//! This module defines the fundamental data structures shared by providers and
//! the orchestrator: model identities, capabilities, complexity tiers, task
//! requests, normalized responses, per-provider statistics and the
//! [`Provider`] trait itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Model Identity
// ============================================================================

/// Stable identifier of one deployable backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    /// Largest hosted Anthropic model
    ClaudeOpus,
    /// Balanced hosted Anthropic model
    ClaudeSonnet,
    /// Fast hosted Anthropic model
    ClaudeHaiku,
    /// Hosted OpenAI flagship model
    Gpt4o,
    /// Hosted OpenAI small model
    Gpt4oMini,
    /// Local general-purpose model
    OllamaLlama,
    /// Local code model
    OllamaCodellama,
    /// Local small chat model
    OllamaMistral,
}

impl ModelId {
    /// Every known identity, in declaration order.
    pub fn all() -> &'static [ModelId] {
        &[
            ModelId::ClaudeOpus,
            ModelId::ClaudeSonnet,
            ModelId::ClaudeHaiku,
            ModelId::Gpt4o,
            ModelId::Gpt4oMini,
            ModelId::OllamaLlama,
            ModelId::OllamaCodellama,
            ModelId::OllamaMistral,
        ]
    }

    /// Configuration-file name of this identity.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::ClaudeOpus => "claude_opus",
            ModelId::ClaudeSonnet => "claude_sonnet",
            ModelId::ClaudeHaiku => "claude_haiku",
            ModelId::Gpt4o => "gpt4o",
            ModelId::Gpt4oMini => "gpt4o_mini",
            ModelId::OllamaLlama => "ollama_llama",
            ModelId::OllamaCodellama => "ollama_codellama",
            ModelId::OllamaMistral => "ollama_mistral",
        }
    }

    /// Backend that serves this identity.
    pub fn provider_kind(&self) -> ProviderKind {
        match self {
            ModelId::ClaudeOpus | ModelId::ClaudeSonnet | ModelId::ClaudeHaiku => {
                ProviderKind::Anthropic
            }
            ModelId::Gpt4o | ModelId::Gpt4oMini => ProviderKind::OpenAI,
            ModelId::OllamaLlama | ModelId::OllamaCodellama | ModelId::OllamaMistral => {
                ProviderKind::Ollama
            }
        }
    }

    /// Default model-name string the backend expects for this identity.
    pub fn default_backend_model(&self) -> &'static str {
        match self {
            ModelId::ClaudeOpus => "claude-opus-4-20250514",
            ModelId::ClaudeSonnet => "claude-sonnet-4-20250514",
            ModelId::ClaudeHaiku => "claude-3-5-haiku-latest",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::OllamaLlama => "llama3.2",
            ModelId::OllamaCodellama => "codellama",
            ModelId::OllamaMistral => "mistral",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing identifiers and tags from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseTagError {}

impl std::str::FromStr for ModelId {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ModelId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ParseTagError {
                kind: "model",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Provider Kind
// ============================================================================

/// Backend family a model is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API (hosted)
    Anthropic,
    /// OpenAI Chat Completions API (hosted)
    OpenAI,
    /// Ollama inference server (local)
    Ollama,
}

impl ProviderKind {
    /// Default base URL for this backend.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// Whether calls against this backend are billed.
    pub fn is_metered(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Check if this backend requires an API key.
    pub fn requires_api_key(&self) -> bool {
        match self {
            Self::Anthropic | Self::OpenAI => true,
            Self::Ollama => false,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "Anthropic"),
            Self::OpenAI => write!(f, "OpenAI"),
            Self::Ollama => write!(f, "Ollama"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "gpt" => Ok(Self::OpenAI),
            "ollama" | "local" => Ok(Self::Ollama),
            _ => Err(ParseTagError {
                kind: "provider",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Capabilities and Complexity
// ============================================================================

/// Kind of generation a task needs and a model can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextGeneration,
    CodeGeneration,
    Analysis,
    Reasoning,
    Creativity,
    Conversation,
    Specialized,
}

impl Capability {
    /// Get all capabilities.
    pub fn all() -> &'static [Capability] {
        &[
            Capability::TextGeneration,
            Capability::CodeGeneration,
            Capability::Analysis,
            Capability::Reasoning,
            Capability::Creativity,
            Capability::Conversation,
            Capability::Specialized,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextGeneration => "text-generation",
            Capability::CodeGeneration => "code-generation",
            Capability::Analysis => "analysis",
            Capability::Reasoning => "reasoning",
            Capability::Creativity => "creativity",
            Capability::Conversation => "conversation",
            Capability::Specialized => "specialized",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Capability::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ParseTagError {
                kind: "capability",
                value: s.to_string(),
            })
    }
}

/// Caller-declared difficulty tier of a task.
///
/// Ordered: `Simple < Medium < Complex < Expert`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
    Expert,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Complex => write!(f, "complex"),
            Complexity::Expert => write!(f, "expert"),
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "medium" => Ok(Complexity::Medium),
            "complex" => Ok(Complexity::Complex),
            "expert" => Ok(Complexity::Expert),
            _ => Err(ParseTagError {
                kind: "complexity",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Model Configuration
// ============================================================================

/// Static per-model metadata.
///
/// Speed and quality scores are relative rankings on a 1-10 scale. Selection
/// only ever compares them against each other and fixed thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: ModelId,
    pub display_name: String,
    pub provider: ProviderKind,
    /// Model name sent on the wire (e.g. "gpt-4o")
    pub backend_model: String,
    /// Endpoint override; the provider's base URL is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub capabilities: BTreeSet<Capability>,
    /// Maximum output tokens when a request sets none
    pub max_tokens: u32,
    /// Cost of one token, in USD
    pub cost_per_token: f64,
    pub speed_score: u8,
    pub quality_score: u8,
    /// Initial availability; the orchestrator owns the live flag
    pub available: bool,
}

impl ModelConfig {
    /// Whether every required capability is supported.
    pub fn supports_all(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }
}

// ============================================================================
// Requests and Responses
// ============================================================================

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default request priority.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Task type used when the caller gives none.
pub const DEFAULT_TASK_TYPE: &str = "general";

/// One unit of work submitted to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub id: String,
    pub content: String,
    /// Routing key (e.g. "code_generation")
    pub task_type: String,
    pub complexity: Complexity,
    pub required_capabilities: BTreeSet<Capability>,
    /// Overrides the model's configured maximum output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub priority: i32,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TaskRequest {
    /// Create a request with default settings and a fresh id.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            complexity: Complexity::default(),
            required_capabilities: BTreeSet::new(),
            max_tokens: None,
            temperature: DEFAULT_TEMPERATURE,
            priority: DEFAULT_PRIORITY,
            timeout: DEFAULT_TIMEOUT,
            metadata: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Add one required capability.
    pub fn require(mut self, capability: Capability) -> Self {
        self.required_capabilities.insert(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.required_capabilities.extend(capabilities);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Output limit for a given model: the request override, else the model's.
    pub fn effective_max_tokens(&self, model: &ModelConfig) -> u32 {
        self.max_tokens.unwrap_or(model.max_tokens)
    }
}

/// Normalized result of one provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub request_id: String,
    /// Identity that actually served (or last attempted) the request
    pub model: ModelId,
    pub content: String,
    pub tokens_used: u32,
    #[serde(with = "duration_ms")]
    pub response_time: Duration,
    pub cost: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ModelResponse {
    /// Create a successful response.
    pub fn success(
        request_id: impl Into<String>,
        model: ModelId,
        content: impl Into<String>,
        tokens_used: u32,
        cost: f64,
        response_time: Duration,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            model,
            content: content.into(),
            tokens_used,
            response_time,
            cost,
            success: true,
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Create a failed response: zero tokens, zero cost.
    pub fn failure(
        request_id: impl Into<String>,
        model: ModelId,
        error: impl Into<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            model,
            content: String::new(),
            tokens_used: 0,
            response_time,
            cost: 0.0,
            success: false,
            error: Some(error.into()),
            completed_at: Utc::now(),
        }
    }
}

// ============================================================================
// Provider Statistics
// ============================================================================

/// Rolling counters for one provider. Never reset automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    #[serde(with = "duration_ms")]
    pub avg_response_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request_at: Option<DateTime<Utc>>,
}

impl ProviderStats {
    /// Fold one completed call into the counters.
    pub fn record(&mut self, response: &ModelResponse) {
        self.requests += 1;
        if response.success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
            self.last_error = response.error.clone();
        }
        self.total_tokens += u64::from(response.tokens_used);
        self.total_cost += response.cost;

        // Running mean over all calls, in seconds to keep sub-ms precision
        let n = self.requests as f64;
        let avg = self.avg_response_time.as_secs_f64();
        let next = avg + (response.response_time.as_secs_f64() - avg) / n;
        self.avg_response_time = Duration::from_secs_f64(next.max(0.0));
        self.last_request_at = Some(response.completed_at);
    }

    /// Calculate success rate (0.0 to 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            1.0
        } else {
            self.successful_requests as f64 / self.requests as f64
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Trait every model backend adapter implements.
///
/// `generate` is infallible by contract: backend failures of any kind come
/// back as a response with `success == false`. Each call records wall-clock
/// time around the backend call and updates the provider's own stats exactly
/// once.
///
/// # Example
///
/// ```rust,ignore
/// use switchyard::types::{Provider, TaskRequest};
///
/// let response = provider.generate(&TaskRequest::new("Hello")).await;
/// if !response.success {
///     eprintln!("{}", response.error.unwrap_or_default());
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Serve one task request.
    async fn generate(&self, request: &TaskRequest) -> ModelResponse;

    /// Cheap liveness probe. Never panics on backend errors; `false` on any failure.
    async fn health_check(&self) -> bool;

    /// Snapshot of this provider's rolling statistics.
    fn stats(&self) -> ProviderStats;

    /// Static configuration of the model this provider serves.
    fn config(&self) -> &ModelConfig;

    /// Get the name of this provider for display purposes.
    fn name(&self) -> &str;

    /// Identity of the served model.
    fn model_id(&self) -> ModelId {
        self.config().id
    }
}

/// Shared provider that can be cloned across tasks.
pub type SharedProvider = Arc<dyn Provider>;

/// Serialize a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
