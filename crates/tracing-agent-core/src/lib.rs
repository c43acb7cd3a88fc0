// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Context-management core of the tracing agent.
//!
//! For every instrumented operation this crate decides whether a trace is
//! recorded, hands back the matching [`context::TracerContext`] variant, and
//! keeps that decision auditable through the [`so11y`] counters. Decisions
//! run under live policy: the backend pushes ignore-suffix and span-limit
//! updates through the configuration-discovery feed, and the transport layer
//! reports backend connectivity into [`remote::ConnectivityHandle`]. All of
//! it is read lock-free on the hot path; when the backend is unreachable the
//! core degrades to handing out ignored contexts instead of failing callers.

pub mod boot;
pub mod config;
pub mod context;
pub mod policy;
pub mod remote;
pub mod sampling;
pub mod so11y;

pub use boot::{start_tracing_core, TracingCore};
pub use config::AgentConfig;
pub use context::{TraceContextFactory, TracerContext};
pub use remote::{ChannelListener, ChannelStatus, ConnectivityHandle};
