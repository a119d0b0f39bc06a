//! Runtime wiring: Gemini provider, tool runtime and chat service with tracing hooks.

use std::sync::Arc;

use pchat::ChatService;
use pobserve::{SafeChatLoopHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};
use pprovider::adapters::gemini::{GeminiHttpTransport, GeminiProvider};
use pprovider::{ModelProvider, ProviderConfig, ProviderError};
use ptooling::{DefaultToolRuntime, ToolRegistry, ToolRuntime};
use reqwest::Client;

use crate::{Gateway, GatewayConfig};

/// Builds a Gemini provider over a fresh HTTP client.
///
/// Deadlines are enforced per cycle by the provider, so the client itself has no timeout.
pub fn gemini_provider(config: ProviderConfig) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let client = Client::builder()
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;
    Ok(gemini_provider_with_client(config, client))
}

pub fn gemini_provider_with_client(config: ProviderConfig, client: Client) -> Arc<dyn ModelProvider> {
    let transport = Arc::new(GeminiHttpTransport::new(client));
    Arc::new(
        GeminiProvider::new(config, transport)
            .with_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks))),
    )
}

pub fn tool_runtime(registry: ToolRegistry) -> Arc<dyn ToolRuntime> {
    Arc::new(
        DefaultToolRuntime::new(Arc::new(registry))
            .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks))),
    )
}

pub fn chat_service(
    provider: Arc<dyn ModelProvider>,
    config: &GatewayConfig,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
) -> ChatService {
    let mut builder = ChatService::builder(provider)
        .policy(config.policy)
        .hooks(Arc::new(SafeChatLoopHooks::new(TracingObservabilityHooks)));

    if let Some(runtime) = tool_runtime {
        builder = builder.tool_runtime(runtime);
    }

    builder.build()
}

pub fn build_gateway(config: GatewayConfig) -> Result<Gateway, ProviderError> {
    build_gateway_with(config, None)
}

pub fn build_gateway_with_tools(
    config: GatewayConfig,
    registry: ToolRegistry,
) -> Result<Gateway, ProviderError> {
    build_gateway_with(config, Some(tool_runtime(registry)))
}

pub fn build_gateway_with(
    config: GatewayConfig,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
) -> Result<Gateway, ProviderError> {
    let provider = gemini_provider(config.provider.clone())?;
    Ok(Gateway::new(chat_service(provider, &config, tool_runtime)))
}
