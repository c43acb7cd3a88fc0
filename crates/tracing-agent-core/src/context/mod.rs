// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace-context lifecycle: the two context variants and the factory that
//! decides which one each traced operation gets.

pub mod factory;
pub mod ignored_context;
pub mod span;
pub mod tracing_context;

pub use factory::TraceContextFactory;
pub use ignored_context::IgnoredTracerContext;
pub use span::{FinishedSpan, SpanId, SpanRef, TraceSegment};
pub use tracing_context::TracingContext;

/// One traced operation's context, created by the factory in its final
/// state: it never transitions between recording and ignored during its
/// lifetime. Callers drive it through these capability methods and never
/// branch on the variant.
#[derive(Debug)]
pub enum TracerContext {
    Tracing(TracingContext),
    Ignored(IgnoredTracerContext),
}

impl TracerContext {
    pub fn operation_name(&self) -> &str {
        match self {
            TracerContext::Tracing(context) => context.operation_name(),
            TracerContext::Ignored(context) => context.operation_name(),
        }
    }

    /// Whether this occurrence is being recorded.
    pub fn is_sampled(&self) -> bool {
        matches!(self, TracerContext::Tracing(_))
    }

    pub fn create_span(&mut self, operation_name: &str) -> SpanRef {
        match self {
            TracerContext::Tracing(context) => context.create_span(operation_name),
            TracerContext::Ignored(context) => context.create_span(operation_name),
        }
    }

    pub fn stop_span(&mut self) -> bool {
        match self {
            TracerContext::Tracing(context) => context.stop_span(),
            TracerContext::Ignored(context) => context.stop_span(),
        }
    }

    pub fn active_span_count(&self) -> usize {
        match self {
            TracerContext::Tracing(context) => context.active_span_count(),
            TracerContext::Ignored(context) => context.active_span_count(),
        }
    }

    /// Disposes the context. An active context yields its completed segment
    /// for the caller to ship; an ignored one yields nothing.
    pub fn finish(self) -> Option<TraceSegment> {
        match self {
            TracerContext::Tracing(context) => Some(context.finish()),
            TracerContext::Ignored(_) => None,
        }
    }
}
