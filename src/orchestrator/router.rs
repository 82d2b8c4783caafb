// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Routing tables and model selection.
//!
//! Selection is pure: given a request and a view of the registry it always
//! returns the same answer, and it never suspends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog;
use crate::error::RoutingError;
use crate::types::{Complexity, ModelConfig, ModelId, TaskRequest};

/// Quality score an expert-tier task prefers.
pub const EXPERT_QUALITY_THRESHOLD: u8 = 9;

/// Speed score a high-priority task prefers.
pub const FAST_SPEED_THRESHOLD: u8 = 8;

/// Priority above which speed is preferred.
pub const HIGH_PRIORITY_ABOVE: i32 = 5;

/// What the router needs to know about one registered model.
#[derive(Debug, Clone, Copy)]
pub struct CandidateView<'a> {
    pub config: &'a ModelConfig,
    pub available: bool,
}

// ============================================================================
// Routing Table
// ============================================================================

/// Static routing configuration: a global fallback chain plus per-task-type
/// preference lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    pub fallback_chain: Vec<ModelId>,
    pub task_routes: BTreeMap<String, Vec<ModelId>>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            fallback_chain: catalog::default_fallback_chain(),
            task_routes: catalog::default_task_routes(),
        }
    }
}

impl RoutingTable {
    pub fn new(fallback_chain: Vec<ModelId>, task_routes: BTreeMap<String, Vec<ModelId>>) -> Self {
        Self {
            fallback_chain,
            task_routes,
        }
    }

    /// Ordered candidates for a task type: its route, else the fallback chain.
    pub fn candidates(&self, task_type: &str) -> &[ModelId] {
        self.task_routes
            .get(task_type)
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback_chain)
    }

    /// Pick the model that should serve `request`.
    ///
    /// `lookup` returns `None` for identities with no constructed provider.
    /// Candidates are filtered to registered, capable and available models,
    /// then biased toward quality for expert tasks or speed for high-priority
    /// ones; otherwise the first survivor in list order wins.
    pub fn select<'a, F>(&self, request: &TaskRequest, lookup: F) -> Result<ModelId, RoutingError>
    where
        F: Fn(ModelId) -> Option<CandidateView<'a>>,
    {
        let eligible: Vec<&ModelConfig> = self
            .candidates(&request.task_type)
            .iter()
            .filter_map(|id| lookup(*id))
            .filter(|view| view.config.supports_all(&request.required_capabilities))
            .filter(|view| view.available)
            .map(|view| view.config)
            .collect();

        let preferred = if request.complexity == Complexity::Expert {
            eligible
                .iter()
                .find(|config| config.quality_score >= EXPERT_QUALITY_THRESHOLD)
        } else if request.priority > HIGH_PRIORITY_ABOVE {
            eligible
                .iter()
                .find(|config| config.speed_score >= FAST_SPEED_THRESHOLD)
        } else {
            None
        };

        preferred
            .or_else(|| eligible.first())
            .map(|config| config.id)
            .ok_or_else(|| RoutingError::NoSuitableModel {
                task_type: request.task_type.clone(),
                required: request.required_capabilities.clone(),
            })
    }

    /// Fallback order after `tried` failed: the global chain minus `tried`.
    pub fn fallbacks_after(&self, tried: ModelId) -> impl Iterator<Item = ModelId> + '_ {
        self.fallback_chain
            .iter()
            .copied()
            .filter(move |id| *id != tried)
    }
}
