// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::policy::PolicyStore;
use crate::remote::{ChannelListener, ChannelStatus};
use crate::sampling::Sampler;
use crate::so11y::AgentSo11y;

use super::ignored_context::IgnoredTracerContext;
use super::tracing_context::TracingContext;
use super::TracerContext;

/// The single entry point the instrumentation layer calls for every traced
/// operation.
///
/// Each call takes lock-free snapshots of the backend channel status, the
/// ignore-suffix policy, and the sampling budget, and hands back the context
/// variant those decide. The factory holds no locks and records every
/// outcome in the self-observability counters.
pub struct TraceContextFactory {
    keep_tracing: bool,
    policy: Arc<PolicyStore>,
    sampler: Arc<Sampler>,
    so11y: Arc<AgentSo11y>,
    /// Last channel status fanned out by the connectivity monitor; cached
    /// here so the hot path reads its own atomic.
    channel_status: AtomicU8,
}

impl TraceContextFactory {
    pub fn new(
        config: &AgentConfig,
        policy: Arc<PolicyStore>,
        sampler: Arc<Sampler>,
        so11y: Arc<AgentSo11y>,
    ) -> Arc<TraceContextFactory> {
        Arc::new(TraceContextFactory {
            keep_tracing: config.keep_tracing,
            policy,
            sampler,
            so11y,
            channel_status: AtomicU8::new(ChannelStatus::Disconnected as u8),
        })
    }

    /// Decides the context variant for one occurrence of `operation_name`.
    ///
    /// Checked in order: backend connectivity (unless keep-tracing is on),
    /// the ignore-suffix policy, then forced sampling or the budget. Forced
    /// sampling bypasses the budget only; it does not bypass the first two
    /// checks.
    pub fn create_trace_context(&self, operation_name: &str, force_sampling: bool) -> TracerContext {
        // Don't trace anything if the backend is not available.
        if !self.keep_tracing && self.channel_status() == ChannelStatus::Disconnected {
            self.so11y.record_context_create(force_sampling, true);
            return TracerContext::Ignored(IgnoredTracerContext::new(operation_name));
        }

        if let Some(suffix_idx) = operation_name.rfind('.') {
            if self.policy.is_ignored_suffix(&operation_name[suffix_idx..]) {
                self.so11y.record_context_create(force_sampling, true);
                return TracerContext::Ignored(IgnoredTracerContext::new(operation_name));
            }
        }

        if force_sampling || self.sampler.try_sampling(operation_name) {
            self.so11y.record_context_create(force_sampling, false);
            TracerContext::Tracing(TracingContext::new(
                operation_name,
                self.policy.current_span_limit(),
            ))
        } else {
            self.so11y.record_context_create(false, true);
            self.so11y.record_leaked_context();
            TracerContext::Ignored(IgnoredTracerContext::new(operation_name))
        }
    }

    pub fn channel_status(&self) -> ChannelStatus {
        ChannelStatus::from_u8(self.channel_status.load(Ordering::Acquire))
    }
}

impl ChannelListener for TraceContextFactory {
    fn status_changed(&self, status: ChannelStatus) {
        self.channel_status.store(status as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::SAMPLING_WINDOW;
    use config_discovery_core::ConfigChangeWatcher;
    use std::time::Instant;

    fn test_config() -> AgentConfig {
        AgentConfig {
            ignore_suffix: ".gif,.png".to_string(),
            span_limit_per_segment: 300,
            keep_tracing: false,
            sample_n_per_window: -1,
        }
    }

    fn factory_with(config: AgentConfig) -> (Arc<TraceContextFactory>, Arc<AgentSo11y>) {
        let policy = PolicyStore::new(&config);
        let sampler = Arc::new(Sampler::new(config.sample_n_per_window));
        let so11y = AgentSo11y::new();
        let factory = TraceContextFactory::new(&config, policy, sampler, so11y.clone());
        (factory, so11y)
    }

    fn connected(factory: &TraceContextFactory) {
        factory.status_changed(ChannelStatus::Connected);
    }

    #[test]
    fn disconnected_without_keep_tracing_always_ignores() {
        let (factory, so11y) = factory_with(test_config());

        for force_sampling in [false, true] {
            let context = factory.create_trace_context("GET /api/orders", force_sampling);
            assert!(!context.is_sampled());
        }
        assert_eq!(so11y.contexts_ignored(), 2);
        assert_eq!(so11y.contexts_forced(), 0);
        assert_eq!(so11y.contexts_leaked(), 0);
    }

    #[test]
    fn keep_tracing_keeps_generating_contexts_while_disconnected() {
        let mut config = test_config();
        config.keep_tracing = true;
        let (factory, so11y) = factory_with(config);

        let context = factory.create_trace_context("GET /api/orders", false);
        assert!(context.is_sampled());
        assert_eq!(so11y.contexts_sampled(), 1);
    }

    #[test]
    fn ignored_suffix_wins_over_forced_sampling() {
        let (factory, so11y) = factory_with(test_config());
        connected(&factory);

        for force_sampling in [false, true] {
            let context = factory.create_trace_context("GET /images/a.png", force_sampling);
            assert!(!context.is_sampled());
        }
        assert_eq!(so11y.contexts_ignored(), 2);
        assert_eq!(so11y.contexts_forced(), 0);
        assert_eq!(so11y.contexts_leaked(), 0);
    }

    #[test]
    fn operation_names_without_a_dot_are_never_suffix_ignored() {
        let mut config = test_config();
        // A suffix set that would match anything with a dot-free name is
        // impossible; make sure even odd sets cannot trigger.
        config.ignore_suffix = ".png,gif".to_string();
        let (factory, _so11y) = factory_with(config);
        connected(&factory);

        let context = factory.create_trace_context("GET /api/orders-gif", false);
        assert!(context.is_sampled());
    }

    #[test]
    fn suffix_is_computed_from_the_last_dot() {
        let (factory, _so11y) = factory_with(test_config());
        connected(&factory);

        // ".tar.png" ends with the ignored ".png" suffix.
        let ignored = factory.create_trace_context("GET /files/archive.tar.png", false);
        assert!(!ignored.is_sampled());

        // ".png.tar" computes to ".tar", which is not ignored.
        let sampled = factory.create_trace_context("GET /files/archive.png.tar", false);
        assert!(sampled.is_sampled());
    }

    #[test]
    fn forced_sampling_bypasses_the_budget_only() {
        let mut config = test_config();
        config.sample_n_per_window = 1;
        let (factory, so11y) = factory_with(config);
        connected(&factory);

        // Exhaust the window's budget.
        assert!(factory.create_trace_context("GET /api/orders", false).is_sampled());
        assert!(!factory.create_trace_context("GET /api/orders", false).is_sampled());
        assert_eq!(so11y.contexts_leaked(), 1);

        // Forced requests still get an active context.
        let forced = factory.create_trace_context("GET /api/orders", true);
        assert!(forced.is_sampled());
        assert_eq!(so11y.contexts_forced(), 1);
        assert_eq!(so11y.contexts_sampled(), 1);
        assert_eq!(so11y.contexts_leaked(), 1);
    }

    #[test]
    fn denied_sampling_records_ignored_and_leaked_together() {
        let mut config = test_config();
        config.sample_n_per_window = 1;
        let (factory, so11y) = factory_with(config);
        connected(&factory);

        factory.create_trace_context("GET /api/orders", false);
        let denied = factory.create_trace_context("GET /api/orders", false);

        assert!(!denied.is_sampled());
        assert_eq!(so11y.contexts_ignored(), 1);
        assert_eq!(so11y.contexts_leaked(), 1);
    }

    #[test]
    fn non_forced_active_contexts_never_exceed_the_window_budget() {
        let mut config = test_config();
        config.sample_n_per_window = 10;
        let (factory, so11y) = factory_with(config);
        connected(&factory);

        let start = Instant::now();
        let sampled = (0..1_000)
            .filter(|_| factory.create_trace_context("GET /api/orders", false).is_sampled())
            .count();

        // The loop comfortably fits one window; guard against a pathological
        // stall across a boundary.
        if start.elapsed() < SAMPLING_WINDOW {
            assert_eq!(sampled, 10);
            assert_eq!(so11y.contexts_sampled(), 10);
            assert_eq!(so11y.contexts_leaked(), 990);
        }
    }

    #[test]
    fn active_context_captures_span_limit_at_creation() {
        let config = test_config();
        let policy = PolicyStore::new(&config);
        let sampler = Arc::new(Sampler::new(config.sample_n_per_window));
        let so11y = AgentSo11y::new();
        let factory = TraceContextFactory::new(&config, policy.clone(), sampler, so11y);
        connected(&factory);

        let mut old_context = factory.create_trace_context("GET /api/orders", false);

        // Hot-swap the ceiling down; the in-flight context is unaffected.
        crate::policy::SpanLimitWatcher::new(policy).notify(Some("1"));

        for _ in 0..3 {
            old_context.create_span("db.query");
        }
        let segment = old_context.finish().unwrap();
        assert_eq!(segment.spans.len(), 3);

        let mut new_context = factory.create_trace_context("GET /api/orders", false);
        new_context.create_span("db.query");
        new_context.create_span("db.query");
        let segment = new_context.finish().unwrap();
        assert_eq!(segment.spans.len(), 1);
        assert_eq!(segment.dropped_span_count, 1);
    }

    #[test]
    fn reconnect_transition_restores_tracing() {
        let (factory, _so11y) = factory_with(test_config());

        assert!(!factory.create_trace_context("GET /api/orders", false).is_sampled());

        factory.status_changed(ChannelStatus::Connected);
        assert!(factory.create_trace_context("GET /api/orders", false).is_sampled());

        factory.status_changed(ChannelStatus::Disconnected);
        assert!(!factory.create_trace_context("GET /api/orders", false).is_sampled());
    }
}
