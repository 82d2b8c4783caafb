// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Built-in model table and default routing.
//!
//! Scores are relative rankings on a 1-10 scale; prices are USD per token.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;

use crate::types::{Capability, ModelConfig, ModelId};

/// Identity attached to responses for requests that could not be routed.
pub const DEFAULT_MODEL: ModelId = ModelId::ClaudeSonnet;

/// Default health-check timeout in seconds.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;

struct Entry {
    id: ModelId,
    display_name: &'static str,
    capabilities: &'static [Capability],
    max_tokens: u32,
    cost_per_token: f64,
    speed_score: u8,
    quality_score: u8,
}

use Capability::*;

const GENERAL: &[Capability] = &[
    TextGeneration,
    CodeGeneration,
    Analysis,
    Reasoning,
    Creativity,
    Conversation,
];

const LIGHT: &[Capability] = &[TextGeneration, CodeGeneration, Analysis, Conversation];

const ENTRIES: &[Entry] = &[
    Entry {
        id: ModelId::ClaudeOpus,
        display_name: "Claude Opus 4",
        capabilities: &[
            TextGeneration,
            CodeGeneration,
            Analysis,
            Reasoning,
            Creativity,
            Conversation,
            Specialized,
        ],
        max_tokens: 4096,
        cost_per_token: 0.000075,
        speed_score: 4,
        quality_score: 10,
    },
    Entry {
        id: ModelId::ClaudeSonnet,
        display_name: "Claude Sonnet 4",
        capabilities: GENERAL,
        max_tokens: 4096,
        cost_per_token: 0.000015,
        speed_score: 7,
        quality_score: 9,
    },
    Entry {
        id: ModelId::ClaudeHaiku,
        display_name: "Claude Haiku 3.5",
        capabilities: LIGHT,
        max_tokens: 4096,
        cost_per_token: 0.000004,
        speed_score: 9,
        quality_score: 7,
    },
    Entry {
        id: ModelId::Gpt4o,
        display_name: "GPT-4o",
        capabilities: GENERAL,
        max_tokens: 4096,
        cost_per_token: 0.00001,
        speed_score: 7,
        quality_score: 9,
    },
    Entry {
        id: ModelId::Gpt4oMini,
        display_name: "GPT-4o Mini",
        capabilities: LIGHT,
        max_tokens: 4096,
        cost_per_token: 0.0000006,
        speed_score: 9,
        quality_score: 7,
    },
    Entry {
        id: ModelId::OllamaLlama,
        display_name: "Llama 3.2 (local)",
        capabilities: &[TextGeneration, Analysis, Conversation],
        max_tokens: 2048,
        cost_per_token: 0.0,
        speed_score: 6,
        quality_score: 6,
    },
    Entry {
        id: ModelId::OllamaCodellama,
        display_name: "Code Llama (local)",
        capabilities: &[TextGeneration, CodeGeneration, Specialized],
        max_tokens: 2048,
        cost_per_token: 0.0,
        speed_score: 5,
        quality_score: 6,
    },
    Entry {
        id: ModelId::OllamaMistral,
        display_name: "Mistral 7B (local)",
        capabilities: &[TextGeneration, Creativity, Conversation],
        max_tokens: 2048,
        cost_per_token: 0.0,
        speed_score: 8,
        quality_score: 5,
    },
];

static CATALOG: Lazy<BTreeMap<ModelId, ModelConfig>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|entry| {
            let config = ModelConfig {
                id: entry.id,
                display_name: entry.display_name.to_string(),
                provider: entry.id.provider_kind(),
                backend_model: entry.id.default_backend_model().to_string(),
                endpoint: None,
                capabilities: entry.capabilities.iter().copied().collect::<BTreeSet<_>>(),
                max_tokens: entry.max_tokens,
                cost_per_token: entry.cost_per_token,
                speed_score: entry.speed_score,
                quality_score: entry.quality_score,
                available: true,
            };
            (entry.id, config)
        })
        .collect()
});

/// Built-in configuration of one model.
///
/// Every [`ModelId`] has an entry, so this never fails.
pub fn model_config(id: ModelId) -> ModelConfig {
    match CATALOG.get(&id) {
        Some(config) => config.clone(),
        None => unreachable!("catalog covers every ModelId"),
    }
}

/// All built-in configurations, ordered by identity.
pub fn all_models() -> impl Iterator<Item = &'static ModelConfig> {
    CATALOG.values()
}

/// Global fallback chain, best quality first.
pub fn default_fallback_chain() -> Vec<ModelId> {
    vec![
        ModelId::ClaudeSonnet,
        ModelId::Gpt4o,
        ModelId::ClaudeOpus,
        ModelId::ClaudeHaiku,
        ModelId::Gpt4oMini,
        ModelId::OllamaLlama,
        ModelId::OllamaMistral,
        ModelId::OllamaCodellama,
    ]
}

/// Per-task-type preference lists.
pub fn default_task_routes() -> BTreeMap<String, Vec<ModelId>> {
    use ModelId::*;

    let routes: [(&str, &[ModelId]); 7] = [
        ("code_generation", &[ClaudeSonnet, Gpt4o, OllamaCodellama, ClaudeHaiku]),
        ("code_review", &[ClaudeOpus, ClaudeSonnet, Gpt4o]),
        ("analysis", &[ClaudeOpus, ClaudeSonnet, Gpt4o, OllamaLlama]),
        ("reasoning", &[ClaudeOpus, Gpt4o, ClaudeSonnet]),
        ("creative_writing", &[ClaudeSonnet, Gpt4o, OllamaMistral]),
        ("conversation", &[ClaudeHaiku, Gpt4oMini, OllamaMistral, OllamaLlama]),
        ("quick_response", &[ClaudeHaiku, Gpt4oMini, OllamaMistral]),
    ];

    routes
        .into_iter()
        .map(|(task, models)| (task.to_string(), models.to_vec()))
        .collect()
}
