// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Task orchestration across model providers.
//!
//! The [`Orchestrator`] owns the provider registry and routing tables. For
//! each request it selects a model, delegates to that model's provider and,
//! if the call fails, walks the global fallback chain one provider at a time
//! until a call succeeds or the chain is exhausted.
//!
//! # Routing
//!
//! 1. Candidates come from the request's task-type route, or the fallback chain
//! 2. Candidates need a constructed provider, every required capability and
//!    a set availability flag
//! 3. Expert tasks prefer the first candidate with quality >= 9
//! 4. Otherwise priority > 5 prefers the first candidate with speed >= 8
//! 5. Otherwise the first remaining candidate wins
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard::config::Settings;
//! use switchyard::orchestrator::build_orchestrator;
//! use switchyard::types::{Capability, TaskRequest};
//!
//! let orchestrator = build_orchestrator(&Settings::default());
//! let request = TaskRequest::new("Write a binary search in Rust")
//!     .with_task_type("code_generation")
//!     .require(Capability::CodeGeneration);
//! let response = orchestrator.execute_task(&request).await;
//! ```
//!
//! Fallback attempts are strictly sequential and each attempt runs under the
//! request's own timeout, so a long chain of slow failures can take up to
//! `chain length * timeout`. Callers needing a hard deadline wrap
//! `execute_task` in their own `tokio::time::timeout`.

pub mod bootstrap;
pub mod catalog;
pub mod registry;
pub mod router;

pub use bootstrap::build_orchestrator;
pub use registry::{ProviderRegistry, RegistryEntry};
pub use router::RoutingTable;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::RoutingError;
use crate::types::{ModelId, ModelResponse, ProviderStats, SharedProvider, TaskRequest};

// ============================================================================
// Orchestrator Stats
// ============================================================================

/// Read-only snapshot of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorStats {
    /// Stats of every registered provider
    pub providers: BTreeMap<ModelId, ProviderStats>,
    /// Live availability of every registered provider
    pub availability: BTreeMap<ModelId, bool>,
    pub fallback_chain: Vec<ModelId>,
    pub task_routes: BTreeMap<String, Vec<ModelId>>,
    /// Backends that were not constructed, with the reason
    pub absent: BTreeMap<ModelId, String>,
    pub total_providers: usize,
    pub available_providers: usize,
}

/// Where one model stands right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    /// Registered and in rotation
    Ready,
    /// Registered but taken out of rotation
    OutOfRotation,
    /// Provider not constructed
    Absent { reason: String },
    /// Neither registered nor recorded as absent
    Unregistered,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Routes task requests to providers.
///
/// All entry points take `&self`; share one instance behind an `Arc`.
pub struct Orchestrator {
    registry: ProviderRegistry,
    routing: RoutingTable,
    health_check_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator over a populated registry.
    pub fn new(registry: ProviderRegistry, routing: RoutingTable) -> Self {
        Self {
            registry,
            routing,
            health_check_timeout: Duration::from_secs(catalog::DEFAULT_HEALTH_CHECK_TIMEOUT_SECS),
        }
    }

    /// Create an orchestrator from ready providers and a routing table.
    pub fn with_providers(
        providers: impl IntoIterator<Item = SharedProvider>,
        routing: RoutingTable,
    ) -> Self {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }
        Self::new(registry, routing)
    }

    /// Bound each provider's health check.
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn health_check_timeout(&self) -> Duration {
        self.health_check_timeout
    }

    /// Provider registered for `id`, if any.
    pub fn provider(&self, id: ModelId) -> Option<SharedProvider> {
        self.registry.get(id).map(|entry| Arc::clone(entry.provider()))
    }

    /// Registered identities: fallback-chain order first, then the rest.
    pub fn registered_models(&self) -> Vec<ModelId> {
        let mut models: Vec<ModelId> = self
            .routing
            .fallback_chain
            .iter()
            .copied()
            .filter(|id| self.registry.contains(*id))
            .collect();
        for (id, _) in self.registry.iter() {
            if !models.contains(&id) {
                models.push(id);
            }
        }
        models
    }

    /// Whether `id` is registered and currently in rotation.
    pub fn is_available(&self, id: ModelId) -> bool {
        self.registry.get(id).is_some_and(|entry| entry.is_available())
    }

    /// Live status of `id`, from the registry and the availability flag.
    pub fn model_status(&self, id: ModelId) -> ModelStatus {
        match self.registry.get(id) {
            Some(entry) if entry.is_available() => ModelStatus::Ready,
            Some(_) => ModelStatus::OutOfRotation,
            None => match self.registry.absent().get(&id) {
                Some(reason) => ModelStatus::Absent {
                    reason: reason.clone(),
                },
                None => ModelStatus::Unregistered,
            },
        }
    }

    /// Take a model in or out of rotation.
    ///
    /// Returns `false` if no provider is registered for `id`.
    pub fn set_availability(&self, id: ModelId, available: bool) -> bool {
        match self.registry.get(id) {
            Some(entry) => {
                entry.set_available(available);
                info!(model = %id, available, "Availability changed");
                true
            }
            None => false,
        }
    }

    /// Select the model that should serve `request`.
    pub fn find_best_model(&self, request: &TaskRequest) -> Result<ModelId, RoutingError> {
        self.routing
            .select(request, |id| self.registry.candidate(id))
    }

    /// Serve `request`, falling back along the global chain on failure.
    ///
    /// Always returns a response. When no model qualifies, the response is a
    /// failure tagged with [`catalog::DEFAULT_MODEL`] and no provider is called.
    #[cfg_attr(
        feature = "telemetry",
        instrument(skip(self, request), fields(request_id = %request.id, task_type = %request.task_type))
    )]
    pub async fn execute_task(&self, request: &TaskRequest) -> ModelResponse {
        let selected = match self.find_best_model(request) {
            Ok(id) => id,
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "No model selected");
                return ModelResponse::failure(
                    request.id.clone(),
                    catalog::DEFAULT_MODEL,
                    err.to_string(),
                    Duration::ZERO,
                );
            }
        };

        let mut response = match self.registry.get(selected) {
            Some(entry) => entry.provider().generate(request).await,
            None => ModelResponse::failure(
                request.id.clone(),
                selected,
                format!("No provider registered for {}", selected),
                Duration::ZERO,
            ),
        };
        if response.success {
            return response;
        }

        for id in self.routing.fallbacks_after(selected) {
            let Some(entry) = self.registry.get(id) else {
                continue;
            };
            if !entry.is_available() {
                continue;
            }

            warn!(
                request_id = %request.id,
                failed = %response.model,
                error = response.error.as_deref().unwrap_or(""),
                next = %id,
                "Provider failed, falling back"
            );
            response = entry.provider().generate(request).await;
            if response.success {
                info!(request_id = %request.id, model = %id, "Fallback succeeded");
                break;
            }
        }

        if !response.success {
            warn!(
                request_id = %request.id,
                model = %response.model,
                error = response.error.as_deref().unwrap_or(""),
                "All providers failed"
            );
        }
        response
    }

    /// Probe every registered provider concurrently.
    ///
    /// A check that times out or panics is reported as unhealthy. Results are
    /// informational and never change availability.
    pub async fn health_check_all(&self) -> BTreeMap<ModelId, bool> {
        let timeout = self.health_check_timeout;
        let handles: Vec<_> = self
            .registry
            .iter()
            .map(|(id, entry)| {
                let provider = Arc::clone(entry.provider());
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, provider.health_check())
                        .await
                        .unwrap_or(false)
                });
                (id, handle)
            })
            .collect();

        let mut results = BTreeMap::new();
        for (id, handle) in handles {
            let healthy = match handle.await {
                Ok(healthy) => healthy,
                Err(e) => {
                    warn!(model = %id, "Health check task failed: {}", e);
                    false
                }
            };
            results.insert(id, healthy);
        }

        info!(
            healthy = results.values().filter(|h| **h).count(),
            total = results.len(),
            "Health checks finished"
        );
        results
    }

    /// Snapshot of per-provider stats and routing state.
    pub fn get_orchestrator_stats(&self) -> OrchestratorStats {
        let mut providers = BTreeMap::new();
        let mut availability = BTreeMap::new();
        for (id, entry) in self.registry.iter() {
            providers.insert(id, entry.provider().stats());
            availability.insert(id, entry.is_available());
        }
        let available_providers = availability.values().filter(|a| **a).count();

        OrchestratorStats {
            total_providers: providers.len(),
            available_providers,
            providers,
            availability,
            fallback_chain: self.routing.fallback_chain.clone(),
            task_routes: self.routing.task_routes.clone(),
            absent: self.registry.absent().clone(),
        }
    }
}
