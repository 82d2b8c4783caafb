// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`SettingsFile`] is one partially-filled layer as read from disk (YAML or
//! JSON). [`Settings`] is the fully resolved result the orchestrator is built
//! from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::orchestrator::{catalog, RoutingTable};
use crate::providers::BackendConfig;
use crate::types::{ModelConfig, ModelId, ProviderKind};

/// Placeholder shown instead of a configured secret.
pub const REDACTED: &str = "<redacted>";

// ============================================================================
// File Layer
// ============================================================================

/// One configuration layer. Every field is optional; unset fields inherit
/// from lower-precedence layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Anthropic credentials and endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<HostedBackendFile>,

    /// OpenAI credentials and endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<HostedBackendFile>,

    /// Local Ollama server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama: Option<LocalBackendFile>,

    /// Per-model overrides, keyed by model id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<BTreeMap<ModelId, ModelOverride>>,

    /// Global fallback chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_chain: Option<Vec<ModelId>>,

    /// Task-type preference lists; merged key by key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_routes: Option<BTreeMap<String, Vec<ModelId>>>,

    /// Per-provider health-check bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_timeout_secs: Option<u64>,
}

/// Settings for a hosted backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedBackendFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Settings for the local backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBackendFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Override of one model's built-in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOverride {
    /// Initial availability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_token: Option<f64>,
    /// Endpoint for this model only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model name sent to the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_model: Option<String>,
}

impl ModelOverride {
    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &ModelOverride) {
        if other.available.is_some() {
            self.available = other.available;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.cost_per_token.is_some() {
            self.cost_per_token = other.cost_per_token;
        }
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint.clone();
        }
        if other.backend_model.is_some() {
            self.backend_model = other.backend_model.clone();
        }
    }

    /// Apply the set fields to a model configuration.
    pub fn apply(&self, config: &mut ModelConfig) {
        if let Some(available) = self.available {
            config.available = available;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(cost) = self.cost_per_token {
            config.cost_per_token = cost;
        }
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(ref backend_model) = self.backend_model {
            config.backend_model = backend_model.clone();
        }
    }
}

// ============================================================================
// Resolved Settings
// ============================================================================

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub anthropic: BackendConfig,
    pub openai: BackendConfig,
    pub ollama: BackendConfig,
    pub models: BTreeMap<ModelId, ModelOverride>,
    pub routing: RoutingTable,
    pub health_check_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anthropic: BackendConfig::default(),
            openai: BackendConfig::default(),
            ollama: BackendConfig::default(),
            models: BTreeMap::new(),
            routing: RoutingTable::default(),
            health_check_timeout: Duration::from_secs(catalog::DEFAULT_HEALTH_CHECK_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Connection settings for a backend family.
    pub fn backend(&self, kind: ProviderKind) -> &BackendConfig {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Ollama => &self.ollama,
        }
    }

    /// Built-in configuration of `id` with overrides applied.
    pub fn model_config(&self, id: ModelId) -> ModelConfig {
        let mut config = catalog::model_config(id);
        if let Some(model_override) = self.models.get(&id) {
            model_override.apply(&mut config);
        }
        config
    }

    /// Render back into file form with API keys replaced by [`REDACTED`].
    pub fn to_redacted_file(&self) -> SettingsFile {
        let hosted = |backend: &BackendConfig| HostedBackendFile {
            api_key: backend.api_key.as_ref().map(|_| REDACTED.to_string()),
            base_url: backend.base_url.clone(),
        };
        SettingsFile {
            anthropic: Some(hosted(&self.anthropic)),
            openai: Some(hosted(&self.openai)),
            ollama: Some(LocalBackendFile {
                enabled: Some(self.ollama.enabled),
                base_url: self.ollama.base_url.clone(),
            }),
            models: if self.models.is_empty() {
                None
            } else {
                Some(self.models.clone())
            },
            fallback_chain: Some(self.routing.fallback_chain.clone()),
            task_routes: Some(self.routing.task_routes.clone()),
            health_check_timeout_secs: Some(self.health_check_timeout.as_secs()),
        }
    }
}
