// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Build an [`Orchestrator`] from resolved settings.

use tracing::{debug, info};

use super::registry::ProviderRegistry;
use super::Orchestrator;
use crate::config::Settings;
use crate::providers::create_provider;
use crate::types::ModelId;

/// Construct every provider the settings allow and wire up routing.
///
/// Backends whose prerequisites are missing are recorded as absent; this never
/// fails, and an orchestrator with zero providers is valid (every request then
/// reports that no suitable model was found).
pub fn build_orchestrator(settings: &Settings) -> Orchestrator {
    let mut registry = ProviderRegistry::new();

    for id in ModelId::all() {
        let config = settings.model_config(*id);
        let backend = settings.backend(config.provider);
        let slot = create_provider(config, backend);
        debug!(model = %id, ready = slot.is_ready(), "Provider slot resolved");
        registry.insert_slot(*id, slot);
    }

    info!(
        registered = registry.len(),
        absent = registry.absent().len(),
        "Orchestrator ready"
    );

    Orchestrator::new(registry, settings.routing.clone())
        .with_health_check_timeout(settings.health_check_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelOverride;
    use crate::providers::BackendConfig;
    use crate::types::{Capability, ProviderKind, TaskRequest};
    use std::time::Duration;

    #[test]
    fn test_no_credentials_registers_only_local() {
        let settings = Settings::default();
        let orch = build_orchestrator(&settings);

        for id in orch.registered_models() {
            assert_eq!(id.provider_kind(), ProviderKind::Ollama);
        }
        let stats = orch.get_orchestrator_stats();
        assert_eq!(stats.total_providers, 3);
        assert_eq!(stats.absent.len(), 5);
        assert!(stats.absent.contains_key(&ModelId::ClaudeSonnet));
    }

    #[test]
    fn test_everything_disabled_is_valid() {
        let settings = Settings {
            ollama: BackendConfig::disabled(),
            ..Default::default()
        };
        let orch = build_orchestrator(&settings);
        assert!(orch.registered_models().is_empty());
        assert!(orch.find_best_model(&TaskRequest::new("hi")).is_err());
    }

    #[test]
    fn test_credentials_register_hosted() {
        let settings = Settings {
            anthropic: BackendConfig::with_api_key("sk-ant-test"),
            openai: BackendConfig::with_api_key("sk-test"),
            ollama: BackendConfig::disabled(),
            health_check_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let orch = build_orchestrator(&settings);
        assert_eq!(orch.registered_models().len(), 5);
        assert_eq!(orch.health_check_timeout(), Duration::from_secs(3));

        // Default route for code generation starts with Claude Sonnet.
        let request = TaskRequest::new("x")
            .with_task_type("code_generation")
            .require(Capability::CodeGeneration);
        assert_eq!(orch.find_best_model(&request), Ok(ModelId::ClaudeSonnet));
    }

    #[test]
    fn test_overrides_reach_providers() {
        let mut settings = Settings::default();
        settings.models.insert(
            ModelId::OllamaLlama,
            ModelOverride {
                available: Some(false),
                backend_model: Some("llama3.1:70b".to_string()),
                ..Default::default()
            },
        );
        let orch = build_orchestrator(&settings);

        assert!(!orch.is_available(ModelId::OllamaLlama));
        let provider = orch.provider(ModelId::OllamaLlama).unwrap();
        assert_eq!(provider.config().backend_model, "llama3.1:70b");
    }
}
