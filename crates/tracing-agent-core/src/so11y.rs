// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Self-observability counters for trace-context creation outcomes.
//!
//! Four monotonic counters make every sampling/ignoring decision auditable:
//! a context is either sampled (normally or forced) or ignored, and a
//! denied-but-requested context is additionally counted as leaked so an
//! under-provisioned sampling budget shows up in metrics. Counters reset
//! only at process restart and are exported through pull-based snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct AgentSo11y {
    contexts_sampled: AtomicU64,
    contexts_forced: AtomicU64,
    contexts_ignored: AtomicU64,
    contexts_leaked: AtomicU64,
}

impl AgentSo11y {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records the outcome of one `create_trace_context` call. An ignored
    /// outcome wins over the forced flag: a forced request that was still
    /// suppressed counts as ignored.
    pub fn record_context_create(&self, forced: bool, ignored: bool) {
        if ignored {
            self.contexts_ignored.fetch_add(1, Ordering::Relaxed);
        } else if forced {
            self.contexts_forced.fetch_add(1, Ordering::Relaxed);
        } else {
            self.contexts_sampled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a sampling decision lost after the caller committed to
    /// tracing (requested but denied a sample).
    pub fn record_leaked_context(&self) {
        self.contexts_leaked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn contexts_sampled(&self) -> u64 {
        self.contexts_sampled.load(Ordering::Relaxed)
    }

    pub fn contexts_forced(&self) -> u64 {
        self.contexts_forced.load(Ordering::Relaxed)
    }

    pub fn contexts_ignored(&self) -> u64 {
        self.contexts_ignored.load(Ordering::Relaxed)
    }

    pub fn contexts_leaked(&self) -> u64 {
        self.contexts_leaked.load(Ordering::Relaxed)
    }

    /// Point-in-time view for metrics export.
    pub fn snapshot(&self) -> So11ySnapshot {
        So11ySnapshot {
            contexts_sampled: self.contexts_sampled(),
            contexts_forced: self.contexts_forced(),
            contexts_ignored: self.contexts_ignored(),
            contexts_leaked: self.contexts_leaked(),
        }
    }

    pub fn to_json(&self) -> Value {
        self.snapshot().to_json()
    }
}

/// Serializable representation of [`AgentSo11y`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct So11ySnapshot {
    pub contexts_sampled: u64,
    pub contexts_forced: u64,
    pub contexts_ignored: u64,
    pub contexts_leaked: u64,
}

impl So11ySnapshot {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
