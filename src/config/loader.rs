// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading settings layers from JSON and YAML files in the workspace
//! and the user's home directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::ModelId;

use super::types::{HostedBackendFile, LocalBackendFile, ModelOverride, SettingsFile};

/// Config file names to search for in the workspace (in order).
pub const CONFIG_FILES: &[&str] = &[
    "switchyard.yaml",
    "switchyard.yml",
    "switchyard.json",
    ".switchyard/config.yaml",
];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".switchyard";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.switchyard/config.yaml.
pub fn load_global_config() -> Result<Option<SettingsFile>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_file(&path).map(Some)
}

/// Load workspace configuration from the first config file found under
/// `workspace_root`, searching [`CONFIG_FILES`] in order.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML, by extension).
pub fn load_config_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content).map_err(ConfigError::from),
        _ => serde_yaml::from_str(&content).map_err(ConfigError::from),
    }
}

/// Write a settings layer, refusing to overwrite an existing file.
pub fn save_config_file(path: &Path, config: &SettingsFile) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.display().to_string()));
    }

    let content = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => serde_json::to_string_pretty(config)?,
        _ => serde_yaml::to_string(config)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the example configuration to `switchyard.yaml` in the workspace.
pub fn init_config(workspace_root: &Path) -> Result<PathBuf, ConfigError> {
    let path = workspace_root.join(CONFIG_FILES[0]);
    save_config_file(&path, &get_example_config())?;
    Ok(path)
}

/// Find the workspace root by searching for config files.
///
/// Walks up the directory tree from `start` until it finds a directory
/// containing a config file or reaches the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if CONFIG_FILES.iter().any(|f| current.join(f).exists()) {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Get an example configuration.
///
/// API keys are left out; they normally come from the environment.
pub fn get_example_config() -> SettingsFile {
    let mut models = BTreeMap::new();
    models.insert(
        ModelId::OllamaCodellama,
        ModelOverride {
            backend_model: Some("codellama:13b".to_string()),
            ..Default::default()
        },
    );
    models.insert(
        ModelId::ClaudeOpus,
        ModelOverride {
            max_tokens: Some(8192),
            ..Default::default()
        },
    );

    let mut task_routes = BTreeMap::new();
    task_routes.insert(
        "code_generation".to_string(),
        vec![ModelId::ClaudeSonnet, ModelId::OllamaCodellama, ModelId::Gpt4o],
    );

    SettingsFile {
        anthropic: Some(HostedBackendFile::default()),
        openai: Some(HostedBackendFile::default()),
        ollama: Some(LocalBackendFile {
            enabled: Some(true),
            base_url: Some("http://localhost:11434".to_string()),
        }),
        models: Some(models),
        fallback_chain: Some(vec![
            ModelId::ClaudeSonnet,
            ModelId::Gpt4o,
            ModelId::ClaudeHaiku,
            ModelId::OllamaLlama,
        ]),
        task_routes: Some(task_routes),
        health_check_timeout_secs: Some(10),
    }
}
