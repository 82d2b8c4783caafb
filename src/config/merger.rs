// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging settings from different sources with proper precedence.

use std::time::Duration;

use crate::error::ConfigError;
use crate::providers::BackendConfig;
use crate::types::ModelId;

use super::types::{HostedBackendFile, LocalBackendFile, Settings, SettingsFile};

/// Environment variables consulted during merging.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_OLLAMA_ENABLED: &str = "SWITCHYARD_OLLAMA";

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub ollama_base_url: Option<String>,
    pub disable_ollama: bool,
    pub fallback_chain: Option<Vec<ModelId>>,
    pub health_check_timeout_secs: Option<u64>,
}

/// Default settings.
pub fn default_settings() -> Settings {
    Settings::default()
}

/// Build a settings layer from environment variables.
///
/// `lookup` returns the value of a variable, or `None` when unset.
pub fn env_layer<F>(lookup: F) -> SettingsFile
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let hosted = |key_var: &str, url_var: &str| {
        let file = HostedBackendFile {
            api_key: non_empty(key_var),
            base_url: non_empty(url_var),
        };
        (file != HostedBackendFile::default()).then_some(file)
    };

    let ollama = LocalBackendFile {
        enabled: non_empty(ENV_OLLAMA_ENABLED).map(|v| parse_flag(&v)),
        base_url: non_empty(ENV_OLLAMA_BASE_URL),
    };

    SettingsFile {
        anthropic: hosted(ENV_ANTHROPIC_API_KEY, ENV_ANTHROPIC_BASE_URL),
        openai: hosted(ENV_OPENAI_API_KEY, ENV_OPENAI_BASE_URL),
        ollama: (ollama != LocalBackendFile::default()).then_some(ollama),
        ..Default::default()
    }
}

/// Settings layer from the process environment.
pub fn env_layer_from_process() -> SettingsFile {
    env_layer(|key| std::env::var(key).ok())
}

/// `0`, `false`, `no` and `off` disable; anything else enables.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Merge settings layers with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Environment
/// 3. Workspace config
/// 4. Global config (~/.switchyard/config.yaml)
/// 5. Default values
pub fn merge_settings(
    global: Option<SettingsFile>,
    workspace: Option<SettingsFile>,
    env: SettingsFile,
    cli: CliOptions,
) -> Result<Settings, ConfigError> {
    let mut result = default_settings();

    for layer in [global, workspace, Some(env)].into_iter().flatten() {
        apply_layer(&mut result, &layer);
    }

    apply_cli_options(&mut result, &cli);
    validate(&result)?;

    Ok(result)
}

fn apply_hosted(backend: &mut BackendConfig, file: &HostedBackendFile) {
    if file.api_key.is_some() {
        backend.api_key = file.api_key.clone();
    }
    if file.base_url.is_some() {
        backend.base_url = file.base_url.clone();
    }
}

fn apply_layer(result: &mut Settings, layer: &SettingsFile) {
    if let Some(ref anthropic) = layer.anthropic {
        apply_hosted(&mut result.anthropic, anthropic);
    }

    if let Some(ref openai) = layer.openai {
        apply_hosted(&mut result.openai, openai);
    }

    if let Some(ref ollama) = layer.ollama {
        if let Some(enabled) = ollama.enabled {
            result.ollama.enabled = enabled;
        }
        if ollama.base_url.is_some() {
            result.ollama.base_url = ollama.base_url.clone();
        }
    }

    if let Some(ref models) = layer.models {
        for (id, model_override) in models {
            result.models.entry(*id).or_default().merge(model_override);
        }
    }

    if let Some(ref chain) = layer.fallback_chain {
        result.routing.fallback_chain = chain.clone();
    }

    if let Some(ref routes) = layer.task_routes {
        result.routing.task_routes.extend(routes.clone());
    }

    if let Some(secs) = layer.health_check_timeout_secs {
        result.health_check_timeout = Duration::from_secs(secs);
    }
}

fn apply_cli_options(result: &mut Settings, cli: &CliOptions) {
    if cli.ollama_base_url.is_some() {
        result.ollama.base_url = cli.ollama_base_url.clone();
    }

    if cli.disable_ollama {
        result.ollama.enabled = false;
    }

    if let Some(ref chain) = cli.fallback_chain {
        result.routing.fallback_chain = chain.clone();
    }

    if let Some(secs) = cli.health_check_timeout_secs {
        result.health_check_timeout = Duration::from_secs(secs);
    }
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.health_check_timeout.is_zero() {
        return Err(ConfigError::InvalidValue {
            field: "health_check_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    for (id, model_override) in &settings.models {
        if let Some(cost) = model_override.cost_per_token {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("models.{}.cost_per_token", id),
                    message: format!("must be a non-negative number, got {}", cost),
                });
            }
        }
        if model_override.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("models.{}.max_tokens", id),
                message: "must be greater than zero".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ModelOverride;
    use std::collections::{BTreeMap, HashMap};

    fn no_env() -> SettingsFile {
        env_layer(|_| None)
    }

    fn env_of(pairs: &[(&str, &str)]) -> SettingsFile {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_layer(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = merge_settings(None, None, no_env(), CliOptions::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.ollama.enabled);
        assert!(settings.anthropic.api_key.is_none());
        assert_eq!(settings.health_check_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_precedence() {
        let global = SettingsFile {
            anthropic: Some(HostedBackendFile {
                api_key: Some("global-key".to_string()),
                base_url: Some("http://global".to_string()),
            }),
            health_check_timeout_secs: Some(30),
            ..Default::default()
        };
        let workspace = SettingsFile {
            anthropic: Some(HostedBackendFile {
                api_key: Some("workspace-key".to_string()),
                base_url: None,
            }),
            health_check_timeout_secs: Some(20),
            ..Default::default()
        };
        let env = env_of(&[(ENV_ANTHROPIC_API_KEY, "env-key")]);
        let cli = CliOptions {
            health_check_timeout_secs: Some(5),
            ..Default::default()
        };

        let settings = merge_settings(Some(global), Some(workspace), env, cli).unwrap();
        assert_eq!(settings.anthropic.api_key.as_deref(), Some("env-key"));
        // Unset in higher layers, so the global value survives.
        assert_eq!(settings.anthropic.base_url.as_deref(), Some("http://global"));
        assert_eq!(settings.health_check_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_layer() {
        let env = env_of(&[
            (ENV_OPENAI_API_KEY, "sk-test"),
            (ENV_OLLAMA_ENABLED, "false"),
            (ENV_OLLAMA_BASE_URL, "http://gpu-box:11434"),
            (ENV_ANTHROPIC_API_KEY, "  "),
        ]);
        assert!(env.anthropic.is_none());
        assert_eq!(env.openai.unwrap().api_key.as_deref(), Some("sk-test"));
        let ollama = env.ollama.unwrap();
        assert_eq!(ollama.enabled, Some(false));
        assert_eq!(ollama.base_url.as_deref(), Some("http://gpu-box:11434"));

        assert_eq!(no_env(), SettingsFile::default());
    }

    #[test]
    fn test_parse_flag() {
        for off in ["0", "false", "FALSE", "no", "off"] {
            assert!(!parse_flag(off), "{off}");
        }
        for on in ["1", "true", "yes", "on"] {
            assert!(parse_flag(on), "{on}");
        }
    }

    #[test]
    fn test_model_overrides_merge_per_field() {
        let mut global_models = BTreeMap::new();
        global_models.insert(
            ModelId::Gpt4o,
            ModelOverride {
                max_tokens: Some(100),
                endpoint: Some("http://global".to_string()),
                ..Default::default()
            },
        );
        let mut workspace_models = BTreeMap::new();
        workspace_models.insert(
            ModelId::Gpt4o,
            ModelOverride {
                max_tokens: Some(200),
                ..Default::default()
            },
        );

        let settings = merge_settings(
            Some(SettingsFile {
                models: Some(global_models),
                ..Default::default()
            }),
            Some(SettingsFile {
                models: Some(workspace_models),
                ..Default::default()
            }),
            no_env(),
            CliOptions::default(),
        )
        .unwrap();

        let merged = &settings.models[&ModelId::Gpt4o];
        assert_eq!(merged.max_tokens, Some(200));
        assert_eq!(merged.endpoint.as_deref(), Some("http://global"));
    }

    #[test]
    fn test_task_routes_merge_by_key() {
        let mut routes = BTreeMap::new();
        routes.insert("code_generation".to_string(), vec![ModelId::OllamaCodellama]);
        routes.insert("translation".to_string(), vec![ModelId::Gpt4o]);

        let settings = merge_settings(
            None,
            Some(SettingsFile {
                task_routes: Some(routes),
                ..Default::default()
            }),
            no_env(),
            CliOptions::default(),
        )
        .unwrap();

        let task_routes = &settings.routing.task_routes;
        assert_eq!(task_routes["code_generation"], vec![ModelId::OllamaCodellama]);
        assert_eq!(task_routes["translation"], vec![ModelId::Gpt4o]);
        assert!(task_routes.contains_key("reasoning"));
    }

    #[test]
    fn test_cli_disables_ollama_and_sets_chain() {
        let cli = CliOptions {
            disable_ollama: true,
            fallback_chain: Some(vec![ModelId::ClaudeHaiku]),
            ..Default::default()
        };
        let env = env_of(&[(ENV_OLLAMA_ENABLED, "1")]);
        let settings = merge_settings(None, None, env, cli).unwrap();
        assert!(!settings.ollama.enabled);
        assert_eq!(settings.routing.fallback_chain, vec![ModelId::ClaudeHaiku]);
    }

    #[test]
    fn test_validation() {
        let zero_timeout = SettingsFile {
            health_check_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            merge_settings(None, Some(zero_timeout), no_env(), CliOptions::default()),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut models = BTreeMap::new();
        models.insert(
            ModelId::Gpt4o,
            ModelOverride {
                cost_per_token: Some(-1.0),
                ..Default::default()
            },
        );
        let negative_cost = SettingsFile {
            models: Some(models),
            ..Default::default()
        };
        match merge_settings(None, Some(negative_cost), no_env(), CliOptions::default()) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "models.gpt4o.cost_per_token")
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }
}
