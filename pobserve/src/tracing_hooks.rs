//! Structured `tracing` events for provider, tool runtime and chat loop phases.
//!
//! ```rust
//! use pchat::ChatLoopHooks;
//! use pobserve::TracingObservabilityHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatLoopHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_chat_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, ChatLoopHooks, ChatOutcome};
use pcommon::InvocationId;
use pprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, model: &str) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            model
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, model: &str, elapsed: Duration) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            model,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            model,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            upstream_status = error.status,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_call_rejected(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
    ) {
        tracing::info!(
            phase = "tool",
            event = "call_rejected",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            invocation_id = %context.invocation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            error_kind = error.kind.as_str(),
            error = %error.message
        );
    }

    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "dispatch_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            invocation_id = %context.invocation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_dispatch_end(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: Result<&ToolExecutionResult, &ToolError>,
        elapsed: Duration,
    ) {
        match outcome {
            Ok(result) => tracing::info!(
                phase = "tool",
                event = "dispatch_success",
                tool_name = tool_call.name,
                tool_call_id = tool_call.id,
                invocation_id = %context.invocation_id,
                trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
                elapsed_ms = elapsed.as_millis() as u64,
                output_bytes = result.output.len()
            ),
            Err(error) => tracing::warn!(
                phase = "tool",
                event = "dispatch_failure",
                tool_name = tool_call.name,
                tool_call_id = tool_call.id,
                invocation_id = %context.invocation_id,
                trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
                elapsed_ms = elapsed.as_millis() as u64,
                error_kind = error.kind.as_str(),
                error = %error
            ),
        }
    }
}

impl ChatLoopHooks for TracingObservabilityHooks {
    fn on_cycle_start(&self, invocation: &InvocationId, model: &str, cycle: u32) {
        tracing::info!(
            phase = "orchestration",
            event = "cycle_start",
            invocation_id = %invocation,
            model,
            cycle
        );
    }

    fn on_tool_phase(&self, invocation: &InvocationId, cycle: u32, tool_calls: usize) {
        tracing::info!(
            phase = "orchestration",
            event = "tool_phase",
            invocation_id = %invocation,
            cycle,
            tool_calls
        );
    }

    fn on_complete(&self, invocation: &InvocationId, outcome: &ChatOutcome) {
        tracing::info!(
            phase = "orchestration",
            event = "complete",
            invocation_id = %invocation,
            cycles = outcome.cycles,
            finish_reason = outcome.finish_reason.as_str(),
            input_tokens = outcome.usage.input_tokens,
            output_tokens = outcome.usage.output_tokens
        );
    }

    fn on_failure(&self, invocation: &InvocationId, error: &ChatError) {
        tracing::error!(
            phase = "orchestration",
            event = "failure",
            invocation_id = %invocation,
            error_phase = error.phase.map(|phase| phase.as_str()),
            error_kind = error.kind.as_str(),
            error = %error
        );
    }
}
