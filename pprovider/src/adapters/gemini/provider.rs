//! Gemini provider implementation over transport, normalizer and decoder.

use std::sync::Arc;

use tokio::time::Instant;

use crate::{
    CallContext, ChatRequest, CredentialResolver, DeltaStream, ModelProvider, NoopOperationHooks,
    ProviderConfig, ProviderError, ProviderFuture, ProviderId, ProviderOperationHooks, guard_body,
    observe_operation, run_guarded,
};

use super::decode::{decode_stream, decode_unary};
use super::normalize::normalize;
use super::transport::{GeminiTransport, TransportRequest, build_endpoint};
use super::types::GeminiRequest;

#[derive(Clone)]
pub struct GeminiProvider {
    config: Arc<ProviderConfig>,
    credentials: CredentialResolver,
    transport: Arc<dyn GeminiTransport>,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn GeminiTransport>) -> Self {
        let credentials = CredentialResolver::new(config.api_key.clone());
        Self {
            config: Arc::new(config),
            credentials,
            transport,
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn build_gemini_request(
        &self,
        request: &ChatRequest,
    ) -> Result<GeminiRequest, ProviderError> {
        let vision = self.config.vision.supports(request.model());
        normalize(request, vision)
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.config.base_url())
            .field("credentials", &self.credentials)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl ModelProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
        context: CallContext,
    ) -> ProviderFuture<'a, Result<DeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            if context.cancel.is_cancelled() {
                return Err(ProviderError::cancelled("request cancelled"));
            }

            request.validate()?;
            let api_key = self.credentials.resolve(context.request_key.as_ref())?;
            let body = self.build_gemini_request(&request)?;

            let model = request.model();
            let streaming = request.is_streaming();
            let endpoint = build_endpoint(self.config.base_url(), model, streaming);
            let deadline = Instant::now() + self.config.timeouts.timeout_for(model);
            let operation = if streaming {
                "stream_generate"
            } else {
                "generate"
            };

            tracing::debug!(model = %model, streaming, endpoint = %endpoint, "dispatching Gemini request");

            let transport_request = TransportRequest {
                endpoint,
                api_key,
                body,
                streaming,
            };
            let response = observe_operation(
                ProviderId::Gemini,
                operation,
                model,
                self.hooks.as_ref(),
                run_guarded(
                    self.transport.send(transport_request),
                    deadline,
                    &context.cancel,
                ),
            )
            .await?;

            let body = guard_body(response.body, deadline, context.cancel.clone());
            let deltas = if streaming {
                decode_stream(body)
            } else {
                decode_unary(body)
            };

            Ok(deltas as DeltaStream<'a>)
        })
    }
}
