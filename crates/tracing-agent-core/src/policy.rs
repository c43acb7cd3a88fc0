// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hot-reloadable tracing policies.
//!
//! Two policies arrive from the configuration-discovery feed: the set of
//! operation-name suffixes to ignore, and the per-segment span ceiling. Each
//! is published as a whole-value atomic swap, so hot-path readers take
//! lock-free snapshots and never observe a partially updated policy. A
//! blank or malformed delivery retains the previous value; it never clears
//! the policy.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use config_discovery_core::ConfigChangeWatcher;
use tracing::{debug, warn};

use crate::config::AgentConfig;

pub const IGNORE_SUFFIX_KEY: &str = "agent.ignore_suffix";
pub const SPAN_LIMIT_KEY: &str = "agent.span_limit_per_segment";

/// Latest published policy values, shared by every trace-context factory
/// call. Single writer per key (the discovery feed), many readers.
#[derive(Debug)]
pub struct PolicyStore {
    ignore_suffixes: ArcSwap<HashSet<String>>,
    span_limit: AtomicI32,
}

impl PolicyStore {
    pub fn new(config: &AgentConfig) -> Arc<PolicyStore> {
        Arc::new(PolicyStore {
            ignore_suffixes: ArcSwap::from_pointee(parse_suffix_set(&config.ignore_suffix)),
            span_limit: AtomicI32::new(config.span_limit_per_segment),
        })
    }

    /// Snapshot of the ignore-suffix set. The returned set stays valid for
    /// this reader even if a swap happens immediately after.
    pub fn current_ignore_suffixes(&self) -> Arc<HashSet<String>> {
        self.ignore_suffixes.load_full()
    }

    /// Membership check against the current set without cloning a snapshot;
    /// this is the factory's hot-path read.
    pub fn is_ignored_suffix(&self, suffix: &str) -> bool {
        self.ignore_suffixes.load().contains(suffix)
    }

    pub fn current_span_limit(&self) -> i32 {
        self.span_limit.load(Ordering::Acquire)
    }

    fn apply_ignore_suffixes(&self, raw: &str) {
        let suffixes = parse_suffix_set(raw);
        debug!("Ignore-suffix policy updated to {} suffixes", suffixes.len());
        self.ignore_suffixes.store(Arc::new(suffixes));
    }

    fn apply_span_limit(&self, raw: &str) {
        match raw.trim().parse::<i32>() {
            Ok(limit) => {
                debug!("Span-limit policy updated to {limit}");
                self.span_limit.store(limit, Ordering::Release);
            }
            Err(_) => {
                warn!("Discarding malformed span-limit value {raw:?}; keeping previous limit");
            }
        }
    }
}

fn parse_suffix_set(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Feed-side watcher for [`IGNORE_SUFFIX_KEY`].
pub struct IgnoreSuffixWatcher {
    store: Arc<PolicyStore>,
}

impl IgnoreSuffixWatcher {
    pub fn new(store: Arc<PolicyStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

impl ConfigChangeWatcher for IgnoreSuffixWatcher {
    fn watch_key(&self) -> &str {
        IGNORE_SUFFIX_KEY
    }

    fn notify(&self, value: Option<&str>) {
        // Blank/absent means "no change", never "clear the policy".
        if is_blank(value) {
            return;
        }
        if let Some(raw) = value {
            self.store.apply_ignore_suffixes(raw);
        }
    }
}

/// Feed-side watcher for [`SPAN_LIMIT_KEY`].
pub struct SpanLimitWatcher {
    store: Arc<PolicyStore>,
}

impl SpanLimitWatcher {
    pub fn new(store: Arc<PolicyStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

impl ConfigChangeWatcher for SpanLimitWatcher {
    fn watch_key(&self) -> &str {
        SPAN_LIMIT_KEY
    }

    fn notify(&self, value: Option<&str>) {
        if is_blank(value) {
            return;
        }
        if let Some(raw) = value {
            self.store.apply_span_limit(raw);
        }
    }
}
