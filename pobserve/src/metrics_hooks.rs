//! `metrics` counters and histograms for provider, tool runtime and chat loop phases.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use pprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, ChatLoopHooks, ChatOutcome};
use pcommon::InvocationId;
use pprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, model: &str) {
        metrics::counter!(
            "parley_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderId, operation: &str, model: &str, elapsed: Duration) {
        metrics::counter!(
            "parley_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "parley_provider_time_to_headers_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        model: &str,
        error: &ProviderError,
        _elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "model" => model.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_call_rejected(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
    ) {
        metrics::counter!(
            "parley_tool_call_rejected_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
    }

    fn on_dispatch_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "parley_tool_dispatch_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_dispatch_end(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        outcome: Result<&ToolExecutionResult, &ToolError>,
        elapsed: Duration,
    ) {
        let status = match outcome {
            Ok(_) => "success",
            Err(error) => {
                metrics::counter!(
                    "parley_tool_dispatch_failure_total",
                    "tool_name" => tool_call.name.clone(),
                    "error_kind" => error.kind.as_str()
                )
                .increment(1);
                "failure"
            }
        };
        metrics::histogram!(
            "parley_tool_dispatch_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => status
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ChatLoopHooks for MetricsObservabilityHooks {
    fn on_cycle_start(&self, _invocation: &InvocationId, model: &str, _cycle: u32) {
        metrics::counter!("parley_chat_cycle_total", "model" => model.to_string()).increment(1);
    }

    fn on_tool_phase(&self, _invocation: &InvocationId, _cycle: u32, tool_calls: usize) {
        metrics::histogram!("parley_chat_tool_calls_per_cycle").record(tool_calls as f64);
    }

    fn on_complete(&self, _invocation: &InvocationId, outcome: &ChatOutcome) {
        metrics::counter!(
            "parley_chat_complete_total",
            "finish_reason" => outcome.finish_reason.as_str()
        )
        .increment(1);
        metrics::histogram!("parley_chat_cycles_per_invocation").record(outcome.cycles as f64);
    }

    fn on_failure(&self, _invocation: &InvocationId, error: &ChatError) {
        metrics::counter!(
            "parley_chat_failure_total",
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
    }
}
