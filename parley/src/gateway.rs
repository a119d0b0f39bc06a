//! Framework-neutral inbound handler: route, parse, orchestrate, assemble.
//!
//! Any HTTP server can host the gateway by converting its request into an
//! [`InboundRequest`] and writing the returned [`OutboundResponse`] back out.

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderMap, Method};
use pchat::{
    ChatError, ChatInvocation, ChatService, OutboundResponse, ResponseAssembler,
};
use pprovider::{
    ChatMessage, ChatRequest, GenerationOptions, HarmBlockThreshold, HarmCategory, Role,
    SafetyPolicy, ToolCall, ToolDeclaration, request_key_from_headers,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const GOOG_API_KEY_HEADER: &str = "x-goog-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const STREAM_ACTION: &str = "streamGenerateContent";

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    /// Path segments after the gateway prefix, e.g. `["v1beta", "models", "gemini-pro:generateContent"]`.
    pub path: Vec<String>,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, path: Vec<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            path,
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Model name and action from the last path segment, split at `:`.
pub fn route_from_path(path: &[String]) -> Option<(&str, Option<&str>)> {
    let last = path.iter().rev().find(|segment| !segment.trim().is_empty())?;
    let (model, action) = match last.split_once(':') {
        Some((model, action)) => (model, Some(action)),
        None => (last.as_str(), None),
    };
    let model = model.trim();
    (!model.is_empty()).then_some((model, action))
}

#[derive(Clone)]
pub struct Gateway {
    chat: ChatService,
}

impl Gateway {
    pub fn new(chat: ChatService) -> Self {
        Self { chat }
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub async fn handle(
        &self,
        request: InboundRequest,
        cancel: CancellationToken,
    ) -> OutboundResponse<'_> {
        if request.method == Method::OPTIONS {
            return OutboundResponse::json(200, &json!({"body": "OK"}));
        }

        let Some((model, action)) = route_from_path(&request.path) else {
            return OutboundResponse::error(&ChatError::invalid_request(
                "request path does not name a model",
            ));
        };
        let model = model.to_string();
        let action_streams = action == Some(STREAM_ACTION);

        let chat_request = match parse_body(&model, &request.body, action_streams) {
            Ok(chat_request) => chat_request,
            Err(error) => {
                tracing::debug!(
                    phase = "gateway",
                    event = "rejected",
                    model = %model,
                    error = %error,
                    "rejected inbound request"
                );
                return OutboundResponse::error(&error);
            }
        };
        let streaming = chat_request.is_streaming();

        let request_key = request_key_from_headers(
            request.header(GOOG_API_KEY_HEADER),
            request.header(AUTHORIZATION.as_str()),
        );
        let mut invocation = ChatInvocation::new(chat_request).with_request_key(request_key);
        if let Some(trace_id) = request.header(REQUEST_ID_HEADER) {
            invocation = invocation.with_trace_id(trace_id);
        }

        tracing::info!(
            phase = "gateway",
            event = "accepted",
            invocation_id = %invocation.id,
            model = %model,
            streaming,
            "accepted inbound request"
        );

        let events = self.chat.run(invocation, cancel);
        ResponseAssembler::new(model).respond(events, streaming).await
    }
}

#[derive(Debug, Deserialize)]
struct GatewayBody {
    messages: Vec<WireMessage>,
    #[serde(default)]
    tools: Vec<WireTool>,
    temperature: Option<f32>,
    #[serde(alias = "max_output_tokens")]
    max_tokens: Option<u32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    stream: Option<bool>,
    #[serde(default)]
    safety_settings: Vec<WireSafetySetting>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
    tool_call_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Debug, Deserialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTool {
    Function { function: WireFunction },
    Bare(WireFunction),
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct WireSafetySetting {
    category: String,
    threshold: String,
}

fn parse_body(model: &str, body: &[u8], action_streams: bool) -> Result<ChatRequest, ChatError> {
    let body: GatewayBody = serde_json::from_slice(body)
        .map_err(|err| ChatError::invalid_request(format!("malformed request body: {err}")))?;

    let messages = body
        .messages
        .into_iter()
        .map(into_message)
        .collect::<Result<Vec<_>, _>>()?;

    let tools = body
        .tools
        .into_iter()
        .map(|tool| {
            let function = match tool {
                WireTool::Function { function } | WireTool::Bare(function) => function,
            };
            ToolDeclaration::new(function.name, function.description, function.parameters)
        })
        .collect::<Vec<_>>();

    let mut safety = SafetyPolicy::default();
    for setting in body.safety_settings {
        let category = HarmCategory::parse(&setting.category).ok_or_else(|| {
            ChatError::invalid_request(format!("unknown safety category '{}'", setting.category))
        })?;
        let threshold = HarmBlockThreshold::parse(&setting.threshold).ok_or_else(|| {
            ChatError::invalid_request(format!("unknown safety threshold '{}'", setting.threshold))
        })?;
        safety = safety.with_threshold(category, threshold);
    }

    let options = GenerationOptions {
        temperature: body.temperature,
        max_output_tokens: body.max_tokens,
        top_p: body.top_p,
        top_k: body.top_k,
        stream: body.stream.unwrap_or(action_streams),
    };

    ChatRequest::builder(model)
        .messages(messages)
        .tools(tools)
        .options(options)
        .safety(safety)
        .build()
        .map_err(ChatError::from)
}

fn into_message(message: WireMessage) -> Result<ChatMessage, ChatError> {
    let role = Role::parse(&message.role).ok_or_else(|| {
        ChatError::invalid_request(format!("unsupported message role '{}'", message.role))
    })?;

    let mut text = String::new();
    let mut images = Vec::new();
    match message.content {
        Some(WireContent::Text(content)) => text = content,
        Some(WireContent::Parts(parts)) => {
            for part in parts {
                match part {
                    WirePart::Text { text: fragment } => text.push_str(&fragment),
                    WirePart::ImageUrl { image_url } => images.push(image_url.url),
                }
            }
        }
        None => {}
    }

    let tool_calls = message
        .tool_calls
        .into_iter()
        .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
        .collect();

    Ok(ChatMessage {
        tool_calls,
        tool_call_id: message.tool_call_id,
        name: message.name,
        ..ChatMessage::new(role, text).with_images(images)
    })
}
