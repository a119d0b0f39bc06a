//! Common `pprovider` imports for downstream crates.

pub use crate::{
    CallContext, ChatMessage, ChatRequest, ChatRequestBuilder, Conversation, DeltaStream,
    FinishReason, GenerationOptions, ModelProvider, NormalizedDelta, ProviderConfig,
    ProviderError, ProviderErrorKind, ProviderId, ProviderOperationHooks, Role, SafetyPolicy,
    TokenUsage, ToolCall, ToolCallFragment, ToolDeclaration, ToolResult,
};
pub use pcommon::{BoxFuture, MetadataMap};
