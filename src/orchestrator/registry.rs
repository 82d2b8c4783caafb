// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Provider registry.
//!
//! Written once while the orchestrator is built and read-only afterwards,
//! apart from each entry's availability flag.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::providers::ProviderSlot;
use crate::types::{ModelConfig, ModelId, SharedProvider};

use super::router::CandidateView;

// ============================================================================
// Registry Entry
// ============================================================================

/// A constructed provider and its live availability flag.
pub struct RegistryEntry {
    provider: SharedProvider,
    available: AtomicBool,
}

impl RegistryEntry {
    fn new(provider: SharedProvider) -> Self {
        let available = AtomicBool::new(provider.config().available);
        Self {
            provider,
            available,
        }
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    pub fn config(&self) -> &ModelConfig {
        self.provider.config()
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Mapping from model identity to constructed provider, plus the reasons
/// absent backends were skipped.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<ModelId, RegistryEntry>,
    absent: BTreeMap<ModelId, String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructed provider under its own model identity.
    ///
    /// A later registration for the same identity replaces the earlier one.
    pub fn register(&mut self, provider: SharedProvider) {
        let id = provider.model_id();
        self.absent.remove(&id);
        self.entries.insert(id, RegistryEntry::new(provider));
    }

    /// Record a factory outcome for `id`.
    pub fn insert_slot(&mut self, id: ModelId, slot: ProviderSlot) {
        match slot {
            ProviderSlot::Ready(provider) => self.register(provider),
            ProviderSlot::Absent { reason } => {
                self.entries.remove(&id);
                self.absent.insert(id, reason);
            }
        }
    }

    pub fn get(&self, id: ModelId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Router view of one model; `None` when no provider is registered.
    pub fn candidate(&self, id: ModelId) -> Option<CandidateView<'_>> {
        self.entries.get(&id).map(|entry| CandidateView {
            config: entry.config(),
            available: entry.is_available(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &RegistryEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn absent(&self) -> &BTreeMap<ModelId, String> {
        &self.absent
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_available()).count()
    }
}
