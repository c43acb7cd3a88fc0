// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

/// Suffixes ignored out of the box; covers static web assets that generate
/// high-volume, low-value traces.
const DEFAULT_IGNORE_SUFFIX: &str = ".jpg,.jpeg,.js,.css,.png,.bmp,.gif,.ico,.mp3,.mp4,.html,.svg";
const DEFAULT_SPAN_LIMIT_PER_SEGMENT: i32 = 300;
/// Non-positive disables the sampling limiter: every non-forced call samples.
const DEFAULT_SAMPLE_N_PER_WINDOW: i32 = -1;

/// Boot-time agent configuration, read once from the environment before any
/// dynamic update arrives. Every value has a default; malformed input falls
/// back rather than failing the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Comma-separated operation-name suffixes to ignore, e.g. ".gif,.png".
    pub ignore_suffix: String,
    /// Ceiling on spans recorded per segment; captured by each context at
    /// creation time.
    pub span_limit_per_segment: i32,
    /// Keep generating local trace contexts while the backend channel is
    /// disconnected (for deployments that buffer locally).
    pub keep_tracing: bool,
    /// Maximum new trace starts sampled per replenishment window.
    pub sample_n_per_window: i32,
}

impl AgentConfig {
    pub fn new() -> AgentConfig {
        let ignore_suffix = env::var("TRACE_AGENT_IGNORE_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_IGNORE_SUFFIX.to_string());

        let span_limit_per_segment: i32 = env::var("TRACE_AGENT_SPAN_LIMIT_PER_SEGMENT")
            .ok()
            .and_then(|limit| limit.parse::<i32>().ok())
            .unwrap_or(DEFAULT_SPAN_LIMIT_PER_SEGMENT);

        let keep_tracing = env::var("TRACE_AGENT_KEEP_TRACING")
            .ok()
            .and_then(|keep| keep.parse::<bool>().ok())
            .unwrap_or(false);

        let sample_n_per_window: i32 = env::var("TRACE_AGENT_SAMPLE_N_PER_WINDOW")
            .ok()
            .and_then(|n| n.parse::<i32>().ok())
            .unwrap_or(DEFAULT_SAMPLE_N_PER_WINDOW);

        AgentConfig {
            ignore_suffix,
            span_limit_per_segment,
            keep_tracing,
            sample_n_per_window,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            ignore_suffix: DEFAULT_IGNORE_SUFFIX.to_string(),
            span_limit_per_segment: DEFAULT_SPAN_LIMIT_PER_SEGMENT,
            keep_tracing: false,
            sample_n_per_window: DEFAULT_SAMPLE_N_PER_WINDOW,
        }
    }
}
