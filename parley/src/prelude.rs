//! Common imports for most parley applications.

pub use crate::{
    assistant_message, build_gateway, build_gateway_with, build_gateway_with_tools, chat_service,
    gemini_provider, parse_provider_id, request, streaming_request, system_message, tool_runtime,
    user_message,
};
pub use crate::{parley_messages, parley_msg};
pub use crate::{
    ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatInvocation, ChatMessage,
    ChatOutcome, ChatPolicy, ChatRequest, ChatService, Gateway, GatewayConfig, InboundRequest,
    ModelProvider, OutboundResponse, ProviderConfig, ProviderError, ProviderId, ResponseAssembler,
    ResponseBody, Role, Tool, ToolCall, ToolDeclaration, ToolError, ToolExecutionContext,
    ToolRegistry, ToolRuntime, required_str,
};
