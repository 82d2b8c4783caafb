// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for switchyard.
//!
//! Handles loading, merging, and validation of settings from multiple sources:
//! - Global config: ~/.switchyard/config.yaml
//! - Workspace config: switchyard.yaml, switchyard.yml, switchyard.json or
//!   .switchyard/config.yaml
//! - Environment: ANTHROPIC_API_KEY, OPENAI_API_KEY, OLLAMA_BASE_URL, ...
//! - CLI options: command-line arguments
//!
//! Settings are merged with precedence (CLI > env > workspace > global > defaults).
//! A missing file is never an error; a malformed one is.

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_root, get_example_config, get_global_config_dir, get_global_config_path,
    init_config, load_config_file, load_global_config, load_workspace_config, save_config_file,
    CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};

pub use merger::{
    default_settings, env_layer, env_layer_from_process, merge_settings, CliOptions,
    ENV_ANTHROPIC_API_KEY, ENV_ANTHROPIC_BASE_URL, ENV_OLLAMA_BASE_URL, ENV_OLLAMA_ENABLED,
    ENV_OPENAI_API_KEY, ENV_OPENAI_BASE_URL,
};

pub use types::{
    HostedBackendFile, LocalBackendFile, ModelOverride, Settings, SettingsFile, REDACTED,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all settings sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_settings(workspace_root: &Path, cli_options: CliOptions) -> Result<Settings, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;

    merge_settings(global, workspace, env_layer_from_process(), cli_options)
}

/// Like [`load_settings`], but with an explicit file in place of the
/// workspace search. The file must exist.
pub fn load_settings_from(path: &Path, cli_options: CliOptions) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let global = load_global_config()?;
    let explicit = load_config_file(path)?;

    merge_settings(global, Some(explicit), env_layer_from_process(), cli_options)
}
