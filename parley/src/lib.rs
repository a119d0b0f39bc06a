//! Provider gateway facade over the parley workspace crates.
//!
//! This crate is the single dependency for most hosts. It re-exports the core crates,
//! reads operator configuration from the environment, wires the Gemini provider into the
//! tool-call orchestrator, and exposes a framework-neutral [`Gateway`] handler.
//!
//! ```rust,no_run
//! use parley::{GatewayConfig, InboundRequest, build_gateway};
//! use http::Method;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn serve() -> Result<(), parley::ProviderError> {
//! let gateway = build_gateway(GatewayConfig::from_env())?;
//! let inbound = InboundRequest::new(
//!     Method::POST,
//!     vec!["v1beta".into(), "models".into(), "gemini-pro:streamGenerateContent".into()],
//!     r#"{"messages":[{"role":"user","content":"hello"}]}"#,
//! );
//! let response = gateway.handle(inbound, CancellationToken::new()).await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

mod macros;

pub mod config;
pub mod gateway;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatEventStream, ChatInvocation,
    ChatLoopHooks, ChatOutcome, ChatPolicy, ChatService, ChatServiceBuilder, ChunkFramer,
    ErrorEnvelope, OutboundResponse, ResponseAssembler, ResponseBody, SseStream,
    ToolCallAccumulator,
};
pub use pcommon::{BoxFuture, InvocationId, MetadataMap, TraceId};
pub use pobserve::{
    MetricsObservabilityHooks, SafeChatLoopHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use pprovider::{
    CallContext, ChatMessage, ChatRequest, ChatRequestBuilder, Conversation, DeltaStream,
    FinishReason, GenerationOptions, HarmBlockThreshold, HarmCategory, ModelProvider,
    NormalizedDelta, ProviderConfig, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, ProviderOperationHooks, Role, SafetyPolicy, TimeoutTable, TokenUsage, ToolCall,
    ToolCallFragment, ToolDeclaration, ToolResult, VisionTable,
};
pub use ptooling::{
    DefaultToolRuntime, FunctionTool, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolExecutionResult, ToolRegistry, ToolRuntime, optional_str, parse_arguments, required_str,
};

pub use config::GatewayConfig;
pub use gateway::{Gateway, InboundRequest, route_from_path};
pub use runtime::{
    build_gateway, build_gateway_with, build_gateway_with_tools, chat_service, gemini_provider,
    gemini_provider_with_client, tool_runtime,
};
pub use util::{
    assistant_message, parse_provider_id, request, streaming_request, system_message,
    user_message,
};
