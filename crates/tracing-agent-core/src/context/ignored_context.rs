// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::span::SpanRef;

/// The suppressed trace context: every span operation is a no-op.
///
/// Handed out whenever the factory decides not to record an occurrence, so
/// instrumented code runs the same open/close sequence against either
/// variant.
#[derive(Debug)]
pub struct IgnoredTracerContext {
    operation_name: String,
}

impl IgnoredTracerContext {
    pub(crate) fn new(operation_name: &str) -> IgnoredTracerContext {
        IgnoredTracerContext {
            operation_name: operation_name.to_string(),
        }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn create_span(&mut self, _operation_name: &str) -> SpanRef {
        SpanRef::Dropped
    }

    pub fn stop_span(&mut self) -> bool {
        false
    }

    pub fn active_span_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_is_a_no_op() {
        let mut context = IgnoredTracerContext::new("GET /images/a.png");

        assert_eq!(context.operation_name(), "GET /images/a.png");
        assert_eq!(context.create_span("anything"), SpanRef::Dropped);
        assert_eq!(context.create_span("more"), SpanRef::Dropped);
        assert!(!context.stop_span());
        assert_eq!(context.active_span_count(), 0);
    }
}
