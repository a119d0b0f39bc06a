use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, Method};
use parley::pprovider::adapters::gemini::{
    GeminiProvider, GeminiTransport, TransportRequest,
};
use parley::pprovider::{ByteStream, RawResponse};
use parley::{
    Gateway, GatewayConfig, InboundRequest, ModelProvider, ProviderConfig, ProviderError,
    ProviderFuture, ToolDeclaration, ToolRegistry, chat_service, required_str, tool_runtime,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct CapturedCall {
    endpoint: String,
    api_key: String,
    turns: usize,
}

/// Replays one scripted body per call, in order.
#[derive(Debug)]
struct ScriptedTransport {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<CapturedCall>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl GeminiTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> ProviderFuture<'a, Result<RawResponse, ProviderError>> {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(CapturedCall {
                endpoint: request.endpoint,
                api_key: request.api_key.expose_secret().to_string(),
                turns: request.body.contents.len(),
            });

            let reply = self
                .replies
                .lock()
                .expect("replies lock")
                .pop()
                .ok_or_else(|| ProviderError::other("no scripted reply left"))?;
            let body: ByteStream<'static> =
                Box::pin(stream::iter(vec![Ok(Bytes::from(reply))]));
            Ok(RawResponse::new(200, body))
        })
    }
}

fn sse(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {event}\n\n"))
        .collect()
}

fn text_event(text: &str, finish: Option<&str>) -> Value {
    let mut candidate = json!({"content": {"role": "model", "parts": [{"text": text}]}});
    if let Some(finish) = finish {
        candidate["finishReason"] = json!(finish);
    }
    json!({"candidates": [candidate]})
}

fn config(api_key: Option<&str>) -> GatewayConfig {
    let mut provider = ProviderConfig::default().with_base_url("https://gemini.test");
    if let Some(key) = api_key {
        provider = provider.with_api_key(SecretString::from(key.to_string()));
    }
    GatewayConfig::default().with_provider(provider)
}

fn gateway(
    config: GatewayConfig,
    transport: Arc<ScriptedTransport>,
    registry: Option<ToolRegistry>,
) -> Gateway {
    let provider: Arc<dyn ModelProvider> =
        Arc::new(GeminiProvider::new(config.provider.clone(), transport));
    Gateway::new(chat_service(provider, &config, registry.map(tool_runtime)))
}

fn path(model_action: &str) -> Vec<String> {
    vec![
        "v1beta".to_string(),
        "models".to_string(),
        model_action.to_string(),
    ]
}

fn body(value: Value) -> Bytes {
    Bytes::from(value.to_string())
}

fn frames(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split("\n\n")
        .filter(|frame| !frame.is_empty())
        .map(str::to_string)
        .collect()
}

fn frame_json(frame: &str) -> Value {
    serde_json::from_str(frame.trim_start_matches("data: ")).expect("frame should be JSON")
}

#[tokio::test]
async fn options_preflight_returns_ok_without_upstream_call() {
    let transport = ScriptedTransport::new(Vec::new());
    let gateway = gateway(config(Some("operator-key")), transport.clone(), None);

    let response = gateway
        .handle(
            InboundRequest::new(Method::OPTIONS, path("gemini-pro"), Bytes::new()),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(response.status, 200);
    let body: Value =
        serde_json::from_slice(&response.collect_body().await).expect("body should be JSON");
    assert_eq!(body, json!({"body": "OK"}));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn streaming_request_reframes_gemini_events_as_openai_chunks() {
    let transport = ScriptedTransport::new(vec![sse(&[
        text_event("Hel", None),
        text_event("lo", Some("STOP")),
    ])]);
    let gateway = gateway(config(Some("operator-key")), transport.clone(), None);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer caller-key"));
    let inbound = InboundRequest::new(
        Method::POST,
        path("gemini-pro:streamGenerateContent"),
        body(json!({"messages": [{"role": "user", "content": "hi"}]})),
    )
    .with_headers(headers);

    let response = gateway.handle(inbound, CancellationToken::new()).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/event-stream"));
    assert_eq!(response.header("cache-control"), Some("no-cache"));
    assert_eq!(response.header("connection"), Some("keep-alive"));
    assert_eq!(response.header("x-accel-buffering"), Some("no"));

    let frames = frames(&response.collect_body().await);
    assert_eq!(frames.len(), 4);
    let first = frame_json(&frames[0]);
    assert_eq!(first["object"], "chat.completion.chunk");
    assert_eq!(first["model"], "gemini-pro");
    assert_eq!(first["choices"][0]["delta"]["content"], "Hel");
    assert_eq!(frame_json(&frames[1])["choices"][0]["delta"]["content"], "lo");
    assert_eq!(frame_json(&frames[2])["choices"][0]["finish_reason"], "stop");
    assert_eq!(frames[3], "data: [DONE]");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].api_key, "caller-key");
    assert_eq!(
        calls[0].endpoint,
        "https://gemini.test/v1beta/models/gemini-pro:streamGenerateContent?alt=sse"
    );
}

#[tokio::test]
async fn missing_key_is_rejected_with_401_before_any_upstream_call() {
    let transport = ScriptedTransport::new(Vec::new());
    let gateway = gateway(config(None), transport.clone(), None);

    let response = gateway
        .handle(
            InboundRequest::new(
                Method::POST,
                path("gemini-pro:streamGenerateContent"),
                body(json!({"messages": [{"role": "user", "content": "hi"}]})),
            ),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(response.status, 401);
    assert!(!response.is_streaming());
    let body: Value =
        serde_json::from_slice(&response.collect_body().await).expect("body should be JSON");
    assert_eq!(
        body["error"]["message"],
        "missing GOOGLE_API_KEY in server env vars"
    );
    assert_eq!(body["error"]["code"], "missing_credential");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected_with_400() {
    let transport = ScriptedTransport::new(Vec::new());
    let gateway = gateway(config(Some("operator-key")), transport.clone(), None);

    let response = gateway
        .handle(
            InboundRequest::new(
                Method::POST,
                path("gemini-pro:generateContent"),
                Bytes::from_static(b"{\"messages\": oops"),
            ),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(response.status, 400);
    let body: Value =
        serde_json::from_slice(&response.collect_body().await).expect("body should be JSON");
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn unary_request_returns_completion_object() {
    let unary = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Hello there"}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
    });
    let transport = ScriptedTransport::new(vec![unary.to_string()]);
    let gateway = gateway(config(Some("operator-key")), transport.clone(), None);

    let response = gateway
        .handle(
            InboundRequest::new(
                Method::POST,
                path("gemini-pro:generateContent"),
                body(json!({"messages": [{"role": "user", "content": "hi"}]})),
            ),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: Value =
        serde_json::from_slice(&response.collect_body().await).expect("body should be JSON");
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello there");
    assert_eq!(body["usage"]["total_tokens"], 6);
    assert!(transport.calls()[0].endpoint.ends_with(":generateContent"));
}

#[tokio::test]
async fn tool_call_round_trip_continues_generation() {
    let function_call = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}
            ]},
            "finishReason": "STOP"
        }]
    });
    let transport = ScriptedTransport::new(vec![
        sse(&[function_call]),
        sse(&[text_event("Sunny in Oslo.", Some("STOP"))]),
    ]);

    let mut registry = ToolRegistry::new();
    registry.register_sync_fn(
        ToolDeclaration::new(
            "get_weather",
            "Current weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}),
        ),
        |args, _context| Ok(format!("{} is sunny", required_str(&args, "city")?)),
    );
    let gateway = gateway(config(Some("operator-key")), transport.clone(), Some(registry));

    let response = gateway
        .handle(
            InboundRequest::new(
                Method::POST,
                path("gemini-2.0-flash:streamGenerateContent"),
                body(json!({
                    "messages": [{"role": "user", "content": "weather in Oslo?"}],
                    "tools": [{"type": "function", "function": {
                        "name": "get_weather",
                        "description": "Current weather",
                        "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
                    }}]
                })),
            ),
            CancellationToken::new(),
        )
        .await;

    let frames = frames(&response.collect_body().await);
    assert_eq!(frame_json(&frames[0])["choices"][0]["delta"]["content"], "Sunny in Oslo.");
    assert_eq!(frames.last().map(String::as_str), Some("data: [DONE]"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].turns, 1);
    assert!(calls[1].turns > calls[0].turns);
}
