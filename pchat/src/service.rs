//! Tool-call orchestration: stream a cycle, execute requested tools, continue.
//!
//! Each invocation runs as a lazy generator. Nothing is sent to the provider until the
//! returned stream is polled, and dropping the stream abandons the in-flight cycle.

use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;
use futures_util::future::join_all;
use pcommon::InvocationId;
use pprovider::{
    CallContext, ChatMessage, ChatRequest, FinishReason, ModelProvider, TokenUsage, ToolCall,
    ToolDeclaration, ToolResult,
};
use ptooling::{ToolError, ToolExecutionContext, ToolRuntime};
use tokio_util::sync::CancellationToken;

use crate::{
    ChatError, ChatErrorPhase, ChatEvent, ChatEventStream, ChatInvocation, ChatLoopHooks,
    ChatOutcome, NoopChatLoopHooks, ToolCallAccumulator,
};

pub const DEFAULT_MAX_CONTINUATION_CYCLES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Continuation calls allowed after the first cycle.
    pub max_continuation_cycles: u32,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_continuation_cycles: DEFAULT_MAX_CONTINUATION_CYCLES,
        }
    }
}

impl ChatPolicy {
    pub fn with_max_continuation_cycles(mut self, max_continuation_cycles: u32) -> Self {
        self.max_continuation_cycles = max_continuation_cycles;
        self
    }
}

#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn ModelProvider>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatLoopHooks>,
}

pub struct ChatServiceBuilder {
    provider: Arc<dyn ModelProvider>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatLoopHooks>,
}

impl ChatServiceBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            tool_runtime: None,
            policy: ChatPolicy::default(),
            hooks: Arc::new(NoopChatLoopHooks),
        }
    }

    pub fn tool_runtime(mut self, tool_runtime: Arc<dyn ToolRuntime>) -> Self {
        self.tool_runtime = Some(tool_runtime);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_continuation_cycles(mut self, max_continuation_cycles: u32) -> Self {
        self.policy.max_continuation_cycles = max_continuation_cycles;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatLoopHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            provider: self.provider,
            tool_runtime: self.tool_runtime,
            policy: self.policy,
            hooks: self.hooks,
        }
    }
}

impl ChatService {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        ChatServiceBuilder::new(provider).build()
    }

    pub fn builder(provider: Arc<dyn ModelProvider>) -> ChatServiceBuilder {
        ChatServiceBuilder::new(provider)
    }

    pub fn policy(&self) -> ChatPolicy {
        self.policy
    }

    /// Drives the invocation until a terminal finish, a failure or cancellation.
    ///
    /// The stream ends with either `ChatEvent::Completed` or a single `Err`.
    pub fn run<'a>(
        &'a self,
        invocation: ChatInvocation,
        cancel: CancellationToken,
    ) -> ChatEventStream<'a> {
        Box::pin(stream! {
            let ChatInvocation { id, mut request, request_key, trace_id } = invocation;
            let context = CallContext::new(cancel.clone()).with_request_key(request_key);
            let mut tool_context =
                ToolExecutionContext::new(id.clone()).with_metadata("model", request.model());
            if let Some(trace_id) = trace_id {
                tool_context = tool_context.with_trace_id(trace_id);
            }

            let mut text = String::new();
            let mut usage = TokenUsage::default();
            let mut executed = Vec::new();
            let mut cycle = 0_u32;

            loop {
                if cancel.is_cancelled() {
                    let error = ChatError::cancelled("invocation cancelled")
                        .with_phase(ChatErrorPhase::Orchestration);
                    self.report_failure(&id, &error);
                    yield Err(error);
                    return;
                }

                self.hooks.on_cycle_start(&id, request.model(), cycle);
                tracing::debug!(
                    phase = "orchestration",
                    event = "cycle_start",
                    invocation_id = %id,
                    model = %request.model(),
                    cycle,
                    "starting chat cycle"
                );

                let mut deltas = match self.provider.stream(request.clone(), context.clone()).await {
                    Ok(deltas) => deltas,
                    Err(err) => {
                        let error = ChatError::from(err);
                        self.report_failure(&id, &error);
                        yield Err(error);
                        return;
                    }
                };

                let mut accumulator = ToolCallAccumulator::new();
                let mut cycle_text = String::new();
                let mut finish = None;

                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        delta = deltas.next() => Some(delta),
                    };

                    let Some(next) = next else {
                        let error = ChatError::cancelled("invocation cancelled")
                            .with_phase(ChatErrorPhase::Transport);
                        self.report_failure(&id, &error);
                        yield Err(error);
                        return;
                    };

                    let Some(delta) = next else {
                        break;
                    };

                    if let Some(fragment) = delta.text.filter(|fragment| !fragment.is_empty()) {
                        cycle_text.push_str(&fragment);
                        yield Ok(ChatEvent::TextDelta(fragment));
                    }

                    accumulator.extend(delta.tool_call_fragments);

                    if let Some(cycle_usage) = delta.usage {
                        usage.accumulate(cycle_usage);
                    }

                    if delta.finish_reason.is_some() {
                        finish = delta.finish_reason;
                        break;
                    }
                }
                drop(deltas);
                text.push_str(&cycle_text);

                let length_capped = matches!(finish, Some(FinishReason::Length));
                let tools_pending = match finish {
                    Some(FinishReason::Error(err)) => {
                        let error = ChatError::from(err);
                        self.report_failure(&id, &error);
                        yield Err(error);
                        return;
                    }
                    Some(FinishReason::Blocked(reason)) => {
                        let error = ChatError::blocked(reason).with_phase(ChatErrorPhase::Decode);
                        self.report_failure(&id, &error);
                        yield Err(error);
                        return;
                    }
                    Some(FinishReason::ToolCalls) => true,
                    None => !accumulator.is_empty(),
                    Some(FinishReason::Stop) | Some(FinishReason::Length) => false,
                };

                let calls = if tools_pending {
                    accumulator.finalize()
                } else {
                    Vec::new()
                };

                if calls.is_empty() {
                    let finish_reason = if length_capped {
                        FinishReason::Length
                    } else {
                        FinishReason::Stop
                    };

                    let mut conversation = request.conversation;
                    conversation.push(ChatMessage::assistant(cycle_text));

                    let outcome = ChatOutcome {
                        finish_reason,
                        text,
                        conversation,
                        usage,
                        cycles: cycle + 1,
                        tool_calls: executed,
                    };

                    self.hooks.on_complete(&id, &outcome);
                    tracing::debug!(
                        phase = "orchestration",
                        event = "completed",
                        invocation_id = %id,
                        cycles = outcome.cycles,
                        finish_reason = outcome.finish_reason.as_str(),
                        "chat invocation completed"
                    );
                    yield Ok(ChatEvent::Completed(outcome));
                    return;
                }

                if cycle >= self.policy.max_continuation_cycles {
                    let error = ChatError::tool_loop_exceeded(self.policy.max_continuation_cycles);
                    self.report_failure(&id, &error);
                    yield Err(error);
                    return;
                }

                yield Ok(ChatEvent::ToolCallsFinalized(calls.clone()));
                self.hooks.on_tool_phase(&id, cycle, calls.len());

                let results = match self
                    .execute_tools(&request, &calls, &tool_context, &cancel)
                    .await
                {
                    Ok(results) => results,
                    Err(error) => {
                        self.report_failure(&id, &error);
                        yield Err(error);
                        return;
                    }
                };
                yield Ok(ChatEvent::ToolResults(results.clone()));

                request
                    .conversation
                    .append_tool_round(cycle_text, calls.clone(), &results);
                executed.extend(calls);
                cycle += 1;

                yield Ok(ChatEvent::ContinuationStarted { cycle });
            }
        })
    }

    /// Drains `run` and returns the final outcome.
    pub async fn complete(
        &self,
        invocation: ChatInvocation,
        cancel: CancellationToken,
    ) -> Result<ChatOutcome, ChatError> {
        let mut events = self.run(invocation, cancel);
        while let Some(event) = events.next().await {
            if let ChatEvent::Completed(outcome) = event? {
                return Ok(outcome);
            }
        }

        Err(ChatError::other("chat stream ended without an outcome")
            .with_phase(ChatErrorPhase::Orchestration))
    }

    async fn execute_tools(
        &self,
        request: &ChatRequest,
        calls: &[ToolCall],
        context: &ToolExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolResult>, ChatError> {
        let executions = calls
            .iter()
            .map(|call| self.execute_tool(call, request.tool(&call.name), context));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(
                ChatError::cancelled("invocation cancelled during tool execution")
                    .with_phase(ChatErrorPhase::Tooling),
            ),
            results = join_all(executions) => Ok(results),
        }
    }

    /// Never fails: every problem becomes a failed result the model can read.
    async fn execute_tool(
        &self,
        call: &ToolCall,
        declaration: Option<&ToolDeclaration>,
        context: &ToolExecutionContext,
    ) -> ToolResult {
        let Some(runtime) = &self.tool_runtime else {
            return self.failed(call, ToolError::unavailable().for_call(call));
        };

        match runtime.execute(call, declaration, context).await {
            Ok(result) => result.into_tool_result(call),
            Err(error) => self.failed(call, error),
        }
    }

    fn failed(&self, call: &ToolCall, error: ToolError) -> ToolResult {
        if error.is_model_error() {
            tracing::debug!(
                phase = "tooling",
                event = "tool_rejected",
                tool_call_id = %call.id,
                tool_name = %call.name,
                error_kind = error.kind.as_str(),
                error = %error,
                "model requested an unusable tool call"
            );
        } else {
            tracing::warn!(
                phase = "tooling",
                event = "tool_failed",
                tool_call_id = %call.id,
                tool_name = %call.name,
                error_kind = error.kind.as_str(),
                error = %error,
                "tool call failed"
            );
        }
        error.into_tool_result(call)
    }

    fn report_failure(&self, invocation: &InvocationId, error: &ChatError) {
        self.hooks.on_failure(invocation, error);
        tracing::debug!(
            phase = error.phase.map(|phase| phase.as_str()).unwrap_or("unknown"),
            event = "failed",
            invocation_id = %invocation,
            error = %error,
            "chat invocation failed"
        );
    }
}
