use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pchat::{ChatError, ChatLoopHooks, ChatOutcome};
use pcommon::InvocationId;
use pprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, model)
        }));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, model: &str, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, model, elapsed)
        }));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_failure(provider, operation, model, error, elapsed)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_call_rejected(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_rejected(tool_call, context, error)
        }));
    }

    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_dispatch_start(tool_call, context)
        }));
    }

    fn on_dispatch_end(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: Result<&ToolExecutionResult, &ToolError>,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_dispatch_end(tool_call, context, outcome, elapsed)
        }));
    }
}

pub struct SafeChatLoopHooks<H> {
    inner: H,
}

impl<H> SafeChatLoopHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatLoopHooks for SafeChatLoopHooks<H>
where
    H: ChatLoopHooks,
{
    fn on_cycle_start(&self, invocation: &InvocationId, model: &str, cycle: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_cycle_start(invocation, model, cycle)
        }));
    }

    fn on_tool_phase(&self, invocation: &InvocationId, cycle: u32, tool_calls: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_tool_phase(invocation, cycle, tool_calls)
        }));
    }

    fn on_complete(&self, invocation: &InvocationId, outcome: &ChatOutcome) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_complete(invocation, outcome)
        }));
    }

    fn on_failure(&self, invocation: &InvocationId, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(invocation, error)
        }));
    }
}
