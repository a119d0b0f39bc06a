use std::sync::{Arc, Mutex};
use std::time::Duration;

use pchat::{ChatError, ChatLoopHooks, ChatOutcome};
use pcommon::InvocationId;
use pprovider::{
    Conversation, FinishReason, ProviderError, ProviderId, ProviderOperationHooks, TokenUsage,
    ToolCall,
};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

use crate::{
    MetricsObservabilityHooks, SafeChatLoopHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("call-1", "get_weather", "{}")
}

fn sample_tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new("inv-1").with_trace_id("trace-1")
}

fn sample_outcome() -> ChatOutcome {
    ChatOutcome {
        finish_reason: FinishReason::Stop,
        text: "done".to_string(),
        conversation: Conversation::new(),
        usage: TokenUsage::default(),
        cycles: 2,
        tool_calls: vec![sample_tool_call()],
    }
}

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let provider_error = ProviderError::timeout("provider timeout").with_status(504);
    hooks.on_attempt_start(ProviderId::Gemini, "stream_generate", "gemini-pro");
    hooks.on_success(
        ProviderId::Gemini,
        "stream_generate",
        "gemini-pro",
        Duration::from_millis(12),
    );
    hooks.on_failure(
        ProviderId::Gemini,
        "generate",
        "gemini-pro",
        &provider_error,
        Duration::from_millis(40),
    );
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    let call = sample_tool_call();
    let context = sample_tool_context();
    let rejected = ToolError::invalid_arguments("missing string argument 'city'").for_call(&call);
    let failed = ToolError::execution("tool failed").for_call(&call);

    hooks.on_call_rejected(&call, &context, &rejected);
    hooks.on_dispatch_start(&call, &context);
    hooks.on_dispatch_end(
        &call,
        &context,
        Ok(&ToolExecutionResult::new("call-1", "ok")),
        Duration::from_millis(20),
    );
    hooks.on_dispatch_end(&call, &context, Err(&failed), Duration::from_millis(20));
}

fn exercise_chat_hooks(hooks: &dyn ChatLoopHooks) {
    let invocation = InvocationId::from("inv-1");
    hooks.on_cycle_start(&invocation, "gemini-pro", 0);
    hooks.on_tool_phase(&invocation, 0, 2);
    hooks.on_complete(&invocation, &sample_outcome());
    hooks.on_failure(&invocation, &ChatError::tool_loop_exceeded(8));
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;
    exercise_provider_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_hooks(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;
    exercise_provider_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_hooks(&hooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl ProviderOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _model: &str) {
        self.push("attempt_start");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _model: &str, _elapsed: Duration) {
        self.push("success");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl ToolRuntimeHooks for RecordingHooks {
    fn on_call_rejected(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
    ) {
        self.push("tool_rejected");
    }

    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push("tool_start");
    }

    fn on_dispatch_end(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        outcome: Result<&ToolExecutionResult, &ToolError>,
        _elapsed: Duration,
    ) {
        self.push(if outcome.is_ok() {
            "tool_success"
        } else {
            "tool_failure"
        });
    }
}

impl ChatLoopHooks for RecordingHooks {
    fn on_cycle_start(&self, _invocation: &InvocationId, _model: &str, _cycle: u32) {
        self.push("cycle_start");
    }

    fn on_tool_phase(&self, _invocation: &InvocationId, _cycle: u32, _tool_calls: usize) {
        self.push("tool_phase");
    }

    fn on_complete(&self, _invocation: &InvocationId, _outcome: &ChatOutcome) {
        self.push("complete");
    }

    fn on_failure(&self, _invocation: &InvocationId, _error: &ChatError) {
        self.push("chat_failure");
    }
}

struct PanicHooks;

impl ProviderOperationHooks for PanicHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _model: &str) {
        panic!("attempt_start panic");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _model: &str, _elapsed: Duration) {
        panic!("success panic");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl ToolRuntimeHooks for PanicHooks {
    fn on_call_rejected(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
    ) {
        panic!("rejected panic");
    }

    fn on_dispatch_end(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: Result<&ToolExecutionResult, &ToolError>,
        _elapsed: Duration,
    ) {
        panic!("end panic");
    }
}

impl ChatLoopHooks for PanicHooks {
    fn on_cycle_start(&self, _invocation: &InvocationId, _model: &str, _cycle: u32) {
        panic!("cycle panic");
    }

    fn on_failure(&self, _invocation: &InvocationId, _error: &ChatError) {
        panic!("failure panic");
    }
}

#[test]
fn safe_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_provider_hooks(&SafeProviderHooks::new(inner.clone()));
    exercise_tool_hooks(&SafeToolHooks::new(inner.clone()));
    exercise_chat_hooks(&SafeChatLoopHooks::new(inner));

    assert_eq!(
        events.lock().expect("events lock").as_slice(),
        [
            "attempt_start",
            "success",
            "failure",
            "tool_rejected",
            "tool_start",
            "tool_success",
            "tool_failure",
            "cycle_start",
            "tool_phase",
            "complete",
            "chat_failure",
        ]
    );
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(PanicHooks));
    exercise_tool_hooks(&SafeToolHooks::new(PanicHooks));
    exercise_chat_hooks(&SafeChatLoopHooks::new(PanicHooks));
}
