// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! switchyard - capability-aware routing of AI generation tasks.
//!
//! Routes each task to one of several model backends (Anthropic, OpenAI, a
//! local Ollama server) based on required capabilities, complexity and
//! priority, falls back along a static chain on failure, and keeps per-provider
//! statistics that stay correct under concurrent load.
//!
//! # Architecture
//!
//! - [`types`] - Core type definitions (TaskRequest, ModelResponse, the Provider trait, ...)
//! - [`error`] - Error types and result aliases
//! - [`providers`] - Backend adapters and the shared call path
//! - [`orchestrator`] - Registry, routing, fallback execution, health checks
//! - [`config`] - Settings loading and merging
//! - [`telemetry`] - Tracing setup
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard::config::{load_settings, CliOptions};
//! use switchyard::orchestrator::build_orchestrator;
//! use switchyard::types::TaskRequest;
//!
//! let settings = load_settings(Path::new("."), CliOptions::default())?;
//! let orchestrator = build_orchestrator(&settings);
//! let response = orchestrator.execute_task(&TaskRequest::new("Hello")).await;
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, ProviderError, Result, RoutingError};
pub use orchestrator::{
    build_orchestrator, ModelStatus, Orchestrator, OrchestratorStats, RoutingTable,
};
pub use providers::{create_provider, BackendConfig, ProviderSlot};
pub use types::{
    Capability, Complexity, ModelConfig, ModelId, ModelResponse, Provider,
    ProviderKind, ProviderStats, SharedProvider, TaskRequest,
};

/// switchyard version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
