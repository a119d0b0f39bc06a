//! Tool-call orchestration and OpenAI-compatible response assembly.

mod accumulator;
mod assembler;
mod error;
mod hooks;
mod service;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatEventStream, ChatInvocation,
        ChatLoopHooks, ChatOutcome, ChatPolicy, ChatService, ChatServiceBuilder,
        OutboundResponse, ResponseAssembler, ResponseBody,
    };
    pub use pcommon::{InvocationId, MetadataMap, TraceId};
    pub use ptooling::{
        DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolRegistry, ToolRuntime,
    };
}

pub use accumulator::ToolCallAccumulator;
pub use assembler::{
    ChatCompletion, ChatCompletionChunk, ChunkChoice, ChunkDelta, ChunkFramer, CompletionChoice,
    CompletionMessage, CompletionUsage, ErrorBody, ErrorEnvelope, JSON_HEADERS,
    OutboundResponse, ResponseAssembler, ResponseBody, SSE_DONE, SSE_HEADERS, SseStream,
    encode_sse,
};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase};
pub use hooks::{ChatLoopHooks, NoopChatLoopHooks};
pub use service::{ChatPolicy, ChatService, ChatServiceBuilder, DEFAULT_MAX_CONTINUATION_CYCLES};
pub use types::{ChatEvent, ChatEventStream, ChatInvocation, ChatOutcome};
pub use pcommon::{InvocationId, MetadataMap, TraceId};
pub use ptooling::{
    DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionResult,
    ToolRegistry, ToolRuntime,
};
