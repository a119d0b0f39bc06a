//! Provider layer: canonical chat model, Gemini adapter and the normalized delta protocol.

mod config;
mod credentials;
mod delta;
mod error;
mod hooks;
mod model;
mod provider;
mod transport;

pub mod adapters;
pub mod prelude;

pub use config::{
    DEFAULT_REQUEST_TIMEOUT, GEMINI_BASE_URL, ModelMatch, ProviderConfig,
    THINKING_REQUEST_TIMEOUT, TimeoutTable, VisionTable,
};
pub use credentials::{CredentialResolver, MISSING_CREDENTIAL_MESSAGE, request_key_from_headers};
pub use delta::{DeltaStream, FinishReason, NormalizedDelta, ToolCallFragment, VecDeltaStream};
pub use error::{ProviderError, ProviderErrorKind};
pub use hooks::{NoopOperationHooks, ProviderOperationHooks, observe_operation};
pub use model::{
    ChatMessage, ChatRequest, ChatRequestBuilder, Conversation, GenerationConfig,
    HarmBlockThreshold, HarmCategory, Role, SafetyPolicy, TokenUsage, ToolCall, ToolDeclaration,
    ToolResult,
};
pub use pcommon::GenerationOptions;
pub use provider::{CallContext, ModelProvider, ProviderFuture, ProviderId};
pub use transport::{ByteStream, RawResponse, guard_body, run_guarded};
