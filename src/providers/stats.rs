// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-provider statistics recorder.
//!
//! Every call's contribution (request count, success or failure, tokens,
//! cost, running mean of response time) is applied as one indivisible update
//! under a mutex, so concurrent calls on the same provider never lose
//! increments and snapshots never observe a half-applied call.

use std::sync::Mutex;

use crate::types::{ModelResponse, ProviderStats};

/// Thread-safe accumulator for one provider's [`ProviderStats`].
#[derive(Debug, Default)]
pub struct StatsRecorder {
    inner: Mutex<ProviderStats>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished call into the counters.
    pub fn record(&self, response: &ModelResponse) {
        // A poisoned lock only means another recorder panicked mid-update of
        // plain counters; keep counting.
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.record(response);
    }

    /// Consistent copy of the current counters.
    pub fn snapshot(&self) -> ProviderStats {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
