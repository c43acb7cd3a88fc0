// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::debug;

use super::span::{ActiveSpan, FinishedSpan, SpanRef, TraceSegment, NO_PARENT};

/// An open span slot on the nesting stack. Opens past the ceiling still push
/// an entry so close calls pair up for callers that always close what they
/// open.
#[derive(Debug)]
enum StackEntry {
    Recorded(ActiveSpan),
    Dropped,
}

/// The span-recording trace context.
///
/// Owned exclusively by one unit of execution for the duration of one traced
/// operation; nesting is tracked as a stack, and the span-count ceiling is
/// captured at creation time (later policy swaps do not apply to it).
#[derive(Debug)]
pub struct TracingContext {
    operation_name: String,
    span_limit: i32,
    spans_created: i32,
    dropped_spans: u32,
    stack: Vec<StackEntry>,
    finished: Vec<FinishedSpan>,
}

impl TracingContext {
    pub(crate) fn new(operation_name: &str, span_limit: i32) -> TracingContext {
        TracingContext {
            operation_name: operation_name.to_string(),
            span_limit,
            spans_created: 0,
            dropped_spans: 0,
            stack: Vec::new(),
            finished: Vec::new(),
        }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Ceiling captured when this context was created.
    pub fn span_limit(&self) -> i32 {
        self.span_limit
    }

    /// Opens a child of the currently open span (or a root span). Once the
    /// ceiling is reached further opens are dropped without failing the
    /// caller.
    pub fn create_span(&mut self, operation_name: &str) -> SpanRef {
        if self.spans_created >= self.span_limit {
            if self.dropped_spans == 0 {
                debug!(
                    "Span ceiling {} reached for {}; dropping further spans",
                    self.span_limit, self.operation_name
                );
            }
            self.dropped_spans += 1;
            self.stack.push(StackEntry::Dropped);
            return SpanRef::Dropped;
        }

        let span_id = self.spans_created as u32;
        self.spans_created += 1;

        let parent_span_id = self
            .stack
            .iter()
            .rev()
            .find_map(|entry| match entry {
                StackEntry::Recorded(span) => Some(span.span_id() as i32),
                StackEntry::Dropped => None,
            })
            .unwrap_or(NO_PARENT);

        self.stack
            .push(StackEntry::Recorded(ActiveSpan::new(
                span_id,
                parent_span_id,
                operation_name,
            )));

        SpanRef::Recorded(span_id)
    }

    /// Closes the most recently opened span. Returns false if nothing was
    /// open.
    pub fn stop_span(&mut self) -> bool {
        match self.stack.pop() {
            Some(StackEntry::Recorded(span)) => {
                self.finished.push(span.finish());
                true
            }
            Some(StackEntry::Dropped) => true,
            None => false,
        }
    }

    pub fn active_span_count(&self) -> usize {
        self.stack.len()
    }

    /// Consumes the context, closing any span still open in stack order, and
    /// yields the completed segment for the caller to ship.
    pub fn finish(mut self) -> TraceSegment {
        while self.stop_span() {}

        TraceSegment {
            operation_name: self.operation_name,
            spans: self.finished,
            dropped_span_count: self.dropped_spans,
        }
    }
}
