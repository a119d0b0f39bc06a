//! Chat invocation, outcome and chat event types.

use std::pin::Pin;

use futures_core::Stream;
use pcommon::{InvocationId, TraceId};
use pprovider::{ChatRequest, Conversation, FinishReason, TokenUsage, ToolCall, ToolResult};
use secrecy::SecretString;

use crate::ChatError;

/// One inbound chat call: the request plus the caller identity it runs under.
#[derive(Clone)]
pub struct ChatInvocation {
    pub id: InvocationId,
    pub request: ChatRequest,
    pub request_key: Option<SecretString>,
    pub trace_id: Option<TraceId>,
}

impl ChatInvocation {
    pub fn new(request: ChatRequest) -> Self {
        Self {
            id: InvocationId::generate(),
            request,
            request_key: None,
            trace_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<InvocationId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_request_key(mut self, request_key: Option<SecretString>) -> Self {
        self.request_key = request_key;
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl std::fmt::Debug for ChatInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatInvocation")
            .field("id", &self.id)
            .field("model", &self.request.model())
            .field("request_key", &self.request_key.as_ref().map(|_| "[REDACTED]"))
            .field("trace_id", &self.trace_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub finish_reason: FinishReason,
    /// Text of every cycle, concatenated in emission order.
    pub text: String,
    /// Conversation including tool rounds and the final assistant turn.
    pub conversation: Conversation,
    pub usage: TokenUsage,
    pub cycles: u32,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    TextDelta(String),
    ToolCallsFinalized(Vec<ToolCall>),
    ToolResults(Vec<ToolResult>),
    ContinuationStarted { cycle: u32 },
    Completed(ChatOutcome),
}

/// Pull-based event stream; an `Err` item is always the last item.
pub type ChatEventStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send + 'a>>;
