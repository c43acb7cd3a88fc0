// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Composition root: builds the tracing core and wires its feeds.

use std::sync::Arc;

use config_discovery_core::{DiscoveryHandle, DiscoveryService};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::config::AgentConfig;
use crate::context::TraceContextFactory;
use crate::policy::{IgnoreSuffixWatcher, PolicyStore, SpanLimitWatcher};
use crate::remote::{ConnectivityHandle, ConnectivityMonitor};
use crate::sampling::Sampler;
use crate::so11y::AgentSo11y;

/// Handle bundle for a running tracing core.
///
/// `factory` is what the instrumentation layer calls; `connectivity` is what
/// the transport layer reports status into; `discovery` is where the remote
/// configuration feed delivers updates; `so11y` is the pull-based counter
/// surface.
pub struct TracingCore {
    pub factory: Arc<TraceContextFactory>,
    pub connectivity: ConnectivityHandle,
    pub discovery: DiscoveryHandle,
    pub policy: Arc<PolicyStore>,
    pub so11y: Arc<AgentSo11y>,
    shutdown: CancellationToken,
}

impl TracingCore {
    /// Stops the background dispatch and discovery tasks. In-flight trace
    /// contexts stay valid; only policy/status updates stop flowing.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.discovery.shutdown();
    }
}

/// Builds every component, spawns the connectivity dispatch and discovery
/// service tasks, and registers the policy watchers and the factory's
/// status listener. Must be called from within a tokio runtime.
pub fn start_tracing_core(config: AgentConfig) -> TracingCore {
    let policy = PolicyStore::new(&config);
    let sampler = Arc::new(Sampler::new(config.sample_n_per_window));
    let so11y = AgentSo11y::new();
    let factory = TraceContextFactory::new(&config, policy.clone(), sampler, so11y.clone());

    let shutdown = CancellationToken::new();

    let (monitor, connectivity) = ConnectivityMonitor::new();
    tokio::spawn(monitor.run(shutdown.clone()));
    connectivity.observe_status(factory.clone());

    let (discovery_service, discovery) = DiscoveryService::new();
    tokio::spawn(discovery_service.run());

    if let Err(e) = discovery.register_watcher(IgnoreSuffixWatcher::new(policy.clone())) {
        error!("Failed to register ignore-suffix watcher: {e}");
    }
    if let Err(e) = discovery.register_watcher(SpanLimitWatcher::new(policy.clone())) {
        error!("Failed to register span-limit watcher: {e}");
    }

    TracingCore {
        factory,
        connectivity,
        discovery,
        policy,
        so11y,
        shutdown,
    }
}
