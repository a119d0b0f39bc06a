#![cfg(feature = "provider-gemini")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use pprovider::adapters::gemini::{GeminiProvider, GeminiRequest, GeminiTransport, TransportRequest};
use pprovider::{
    ByteStream, CallContext, ChatMessage, ChatRequest, FinishReason, ModelProvider,
    NormalizedDelta, ProviderConfig, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, ProviderOperationHooks, RawResponse, TimeoutTable, ToolDeclaration,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
struct CapturedCall {
    endpoint: String,
    api_key: String,
    body: GeminiRequest,
    streaming: bool,
}

#[derive(Debug)]
enum Reply {
    Body(Vec<&'static str>),
    Fail(ProviderError),
    Hang,
}

#[derive(Debug)]
struct FakeTransport {
    reply: Reply,
    calls: Mutex<Vec<CapturedCall>>,
}

impl FakeTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl GeminiTransport for FakeTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> ProviderFuture<'a, Result<RawResponse, ProviderError>> {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(CapturedCall {
                endpoint: request.endpoint,
                api_key: request.api_key.expose_secret().to_string(),
                body: request.body,
                streaming: request.streaming,
            });

            match &self.reply {
                Reply::Body(chunks) => {
                    let body: ByteStream<'static> = Box::pin(stream::iter(
                        chunks
                            .iter()
                            .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                            .collect::<Vec<_>>(),
                    ));
                    Ok(RawResponse::new(200, body))
                }
                Reply::Fail(error) => Err(error.clone()),
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl ProviderOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, model: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{provider}:{operation}:{model}"));
    }

    fn on_success(&self, _provider: ProviderId, operation: &str, _model: &str, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{operation}"));
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        operation: &str,
        _model: &str,
        error: &ProviderError,
        _elapsed: Duration,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{operation}:{:?}", error.kind));
    }
}

fn keyed_config() -> ProviderConfig {
    ProviderConfig::default()
        .with_base_url("https://gemini.test")
        .with_api_key(SecretString::from("operator-key"))
}

fn streaming_request() -> ChatRequest {
    ChatRequest::builder("gemini-2.0-flash")
        .message(ChatMessage::system("be brief"))
        .message(ChatMessage::user("hello"))
        .enable_streaming()
        .build()
        .expect("request should build")
}

async fn collect(
    provider: &GeminiProvider,
    request: ChatRequest,
    context: CallContext,
) -> Result<Vec<NormalizedDelta>, ProviderError> {
    let stream = provider.stream(request, context).await?;
    Ok(stream.collect::<Vec<_>>().await)
}

#[tokio::test]
async fn missing_credential_fails_before_any_transport_call() {
    let transport = FakeTransport::new(Reply::Body(Vec::new()));
    let provider = GeminiProvider::new(
        ProviderConfig::default().with_base_url("https://gemini.test"),
        transport.clone(),
    );

    let error = collect(&provider, streaming_request(), CallContext::default())
        .await
        .expect_err("missing key must fail");

    assert_eq!(error.kind, ProviderErrorKind::MissingCredential);
    assert_eq!(error.message, "missing GOOGLE_API_KEY in server env vars");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn request_key_takes_precedence_over_operator_key() {
    let transport = FakeTransport::new(Reply::Body(vec![
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"hi\"}]},\"finishReason\":\"STOP\"}]}\n\n",
    ]));
    let provider = GeminiProvider::new(keyed_config(), transport.clone());
    let context = CallContext::default().with_request_key(Some(SecretString::from("caller-key")));

    collect(&provider, streaming_request(), context)
        .await
        .expect("stream should open");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].api_key, "caller-key");
}

#[tokio::test]
async fn streaming_request_hits_sse_endpoint_and_yields_text_deltas() {
    let transport = FakeTransport::new(Reply::Body(vec![
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}]}\n\n",
    ]));
    let provider = GeminiProvider::new(keyed_config(), transport.clone());

    let deltas = collect(&provider, streaming_request(), CallContext::default())
        .await
        .expect("stream should open");

    let text = deltas
        .iter()
        .filter_map(|delta| delta.text.as_deref())
        .collect::<String>();
    assert_eq!(text, "Hello");
    assert_eq!(
        deltas.last().and_then(|delta| delta.finish_reason.clone()),
        Some(FinishReason::Stop)
    );

    let call = &transport.calls()[0];
    assert!(call.streaming);
    assert_eq!(call.api_key, "operator-key");
    assert_eq!(
        call.endpoint,
        "https://gemini.test/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
    );
    // system and user collapse into one user turn
    assert_eq!(call.body.contents.len(), 1);
    assert_eq!(call.body.contents[0].parts.len(), 2);
}

#[tokio::test]
async fn tool_declarations_are_forwarded_and_function_calls_decoded() {
    let transport = FakeTransport::new(Reply::Body(vec![
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"functionCall\":{\"name\":\"get_weather\",\"args\":{\"city\":\"Oslo\"}}}]},\"finishReason\":\"STOP\"}]}\n\n",
    ]));
    let provider = GeminiProvider::new(keyed_config(), transport.clone());
    let request = ChatRequest::builder("gemini-2.0-flash")
        .message(ChatMessage::user("weather in Oslo?"))
        .tool(ToolDeclaration::new(
            "get_weather",
            "Current weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        ))
        .enable_streaming()
        .build()
        .expect("request should build");

    let deltas = collect(&provider, request, CallContext::default())
        .await
        .expect("stream should open");

    let fragments = deltas
        .iter()
        .flat_map(|delta| delta.tool_call_fragments.iter())
        .collect::<Vec<_>>();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].name.as_deref(), Some("get_weather"));
    assert_eq!(fragments[0].arguments, r#"{"city":"Oslo"}"#);
    assert_eq!(
        deltas.last().and_then(|delta| delta.finish_reason.clone()),
        Some(FinishReason::ToolCalls)
    );

    let tools = transport.calls()[0].body.tools.clone().expect("tools forwarded");
    assert_eq!(tools[0].function_declarations[0].name, "get_weather");
}

#[tokio::test]
async fn unary_request_uses_generate_endpoint_and_single_delta() {
    let transport = FakeTransport::new(Reply::Body(vec![
        "{\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"done\"}]},\"finishReason\":\"STOP\"}],",
        "\"usageMetadata\":{\"promptTokenCount\":2,\"candidatesTokenCount\":1,\"totalTokenCount\":3}}",
    ]));
    let provider = GeminiProvider::new(keyed_config(), transport.clone());
    let request = ChatRequest::builder("gemini-2.0-flash")
        .message(ChatMessage::user("hi"))
        .build()
        .expect("request should build");

    let deltas = collect(&provider, request, CallContext::default())
        .await
        .expect("response should decode");

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].text.as_deref(), Some("done"));
    assert_eq!(deltas[0].usage.map(|usage| usage.total_tokens), Some(3));
    assert!(transport.calls()[0].endpoint.ends_with(":generateContent"));
}

#[tokio::test]
async fn prompt_block_surfaces_as_blocked_finish() {
    let transport = FakeTransport::new(Reply::Body(vec![
        "data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n",
    ]));
    let provider = GeminiProvider::new(keyed_config(), transport);

    let deltas = collect(&provider, streaming_request(), CallContext::default())
        .await
        .expect("stream should open");

    assert_eq!(deltas.len(), 1);
    assert_eq!(
        deltas[0].finish_reason,
        Some(FinishReason::Blocked("SAFETY".to_string()))
    );
}

#[tokio::test]
async fn upstream_failure_is_observed_and_returned() {
    let transport = FakeTransport::new(Reply::Fail(
        ProviderError::transport("RESOURCE_EXHAUSTED: quota").with_status(429),
    ));
    let hooks = Arc::new(RecordingHooks::default());
    let provider = GeminiProvider::new(keyed_config(), transport).with_hooks(hooks.clone());

    let error = collect(&provider, streaming_request(), CallContext::default())
        .await
        .expect_err("upstream failure must surface");

    assert_eq!(error.kind, ProviderErrorKind::Transport);
    assert_eq!(error.status, Some(429));
    assert_eq!(
        *hooks.events.lock().expect("events lock"),
        vec![
            "start:gemini:stream_generate:gemini-2.0-flash".to_string(),
            "failure:stream_generate:Transport".to_string(),
        ]
    );
}

#[tokio::test]
async fn cancelled_context_short_circuits() {
    let transport = FakeTransport::new(Reply::Body(Vec::new()));
    let provider = GeminiProvider::new(keyed_config(), transport.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = collect(&provider, streaming_request(), CallContext::new(cancel))
        .await
        .expect_err("cancelled call must fail");

    assert_eq!(error.kind, ProviderErrorKind::Cancelled);
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_transport_hits_model_deadline() {
    let transport = FakeTransport::new(Reply::Hang);
    let config = keyed_config()
        .with_timeouts(TimeoutTable::default().with_default(Duration::from_millis(50)));
    let provider = GeminiProvider::new(config, transport);

    let error = collect(&provider, streaming_request(), CallContext::default())
        .await
        .expect_err("hung call must time out");

    assert_eq!(error.kind, ProviderErrorKind::Timeout);
}

#[tokio::test]
async fn cancelling_mid_call_stops_waiting_on_transport() {
    let transport = FakeTransport::new(Reply::Hang);
    let provider = GeminiProvider::new(keyed_config(), transport);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let error = collect(&provider, streaming_request(), CallContext::new(cancel))
        .await
        .expect_err("cancelled call must fail");

    assert_eq!(error.kind, ProviderErrorKind::Cancelled);
}
