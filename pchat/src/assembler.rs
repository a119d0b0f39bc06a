//! OpenAI-compatible response assembly: SSE chunk framing, unary completions and
//! error envelopes.
//!
//! ```rust
//! use pchat::{ChunkFramer, encode_sse};
//!
//! let mut framer = ChunkFramer::at("gemini-2.0-flash", 1_700_000_000);
//! let chunk = framer.text_chunk("Hello");
//! assert_eq!(chunk.id, "chatcmpl-1700000000-0");
//!
//! let frame = encode_sse(&chunk);
//! assert!(frame.starts_with(b"data: {"));
//! assert!(frame.ends_with(b"\n\n"));
//! ```

use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use async_stream::stream;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use pprovider::{FinishReason, TokenUsage};
use serde::Serialize;

use crate::{ChatError, ChatErrorPhase, ChatEvent, ChatEventStream, ChatOutcome};

pub const SSE_DONE: &[u8] = b"data: [DONE]\n\n";

pub const SSE_HEADERS: [(&str, &str); 4] = [
    ("content-type", "text/event-stream"),
    ("cache-control", "no-cache"),
    ("connection", "keep-alive"),
    ("x-accel-buffering", "no"),
];

pub const JSON_HEADERS: [(&str, &str); 1] = [("content-type", "application/json")];

pub type SseStream<'a> = Pin<Box<dyn Stream<Item = Bytes> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: CompletionUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<TokenUsage> for CompletionUsage {
    fn from(value: TokenUsage) -> Self {
        Self {
            prompt_tokens: value.input_tokens,
            completion_tokens: value.output_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

/// `{ "error": { "message", "type", "code" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub code: &'static str,
}

impl From<&ChatError> for ErrorEnvelope {
    fn from(value: &ChatError) -> Self {
        Self {
            error: ErrorBody {
                message: value.message.clone(),
                error_type: value.error_type(),
                code: value.kind.as_str(),
            },
        }
    }
}

/// Issues chunk ids `chatcmpl-<base>-<n>` with `n` counting from zero.
#[derive(Debug, Clone)]
pub struct ChunkFramer {
    model: String,
    created: u64,
    base: String,
    sequence: u64,
}

impl ChunkFramer {
    pub fn new(model: impl Into<String>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            model: model.into(),
            created: now.as_secs(),
            base: now.as_millis().to_string(),
            sequence: 0,
        }
    }

    /// Framer with a fixed `created` timestamp, also used as the id base.
    pub fn at(model: impl Into<String>, created: u64) -> Self {
        Self {
            model: model.into(),
            created,
            base: created.to_string(),
            sequence: 0,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn next_id(&mut self) -> String {
        let id = format!("chatcmpl-{}-{}", self.base, self.sequence);
        self.sequence += 1;
        id
    }

    fn chunk(&mut self, delta: ChunkDelta, finish_reason: Option<&'static str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.next_id(),
            object: "chat.completion.chunk",
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    pub fn text_chunk(&mut self, text: impl Into<String>) -> ChatCompletionChunk {
        self.chunk(
            ChunkDelta {
                content: Some(text.into()),
            },
            None,
        )
    }

    pub fn finish_chunk(&mut self, reason: &FinishReason) -> ChatCompletionChunk {
        self.chunk(ChunkDelta::default(), Some(reason.as_str()))
    }

    pub fn completion(&mut self, outcome: &ChatOutcome) -> ChatCompletion {
        ChatCompletion {
            id: self.next_id(),
            object: "chat.completion",
            created: self.created,
            model: self.model.clone(),
            choices: vec![CompletionChoice {
                index: 0,
                message: CompletionMessage {
                    role: "assistant",
                    content: outcome.text.clone(),
                },
                finish_reason: outcome.finish_reason.as_str(),
            }],
            usage: outcome.usage.into(),
        }
    }
}

/// `data: <json>\n\n`
pub fn encode_sse<T: Serialize>(value: &T) -> Bytes {
    match serde_json::to_vec(value) {
        Ok(json) => {
            let mut frame = Vec::with_capacity(json.len() + 8);
            frame.extend_from_slice(b"data: ");
            frame.extend_from_slice(&json);
            frame.extend_from_slice(b"\n\n");
            Bytes::from(frame)
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize SSE payload");
            Bytes::from_static(
                b"data: {\"error\":{\"message\":\"failed to serialize response\",\"type\":\"server_error\",\"code\":\"other\"}}\n\n",
            )
        }
    }
}

fn encode_json<T: Serialize>(value: &T) -> Bytes {
    match serde_json::to_vec(value) {
        Ok(json) => Bytes::from(json),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize JSON response");
            Bytes::from_static(
                b"{\"error\":{\"message\":\"failed to serialize response\",\"type\":\"server_error\",\"code\":\"other\"}}",
            )
        }
    }
}

pub enum ResponseBody<'a> {
    Json(Bytes),
    Sse(SseStream<'a>),
}

impl std::fmt::Debug for ResponseBody<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(bytes) => f.debug_tuple("Json").field(bytes).finish(),
            Self::Sse(_) => f.write_str("Sse(..)"),
        }
    }
}

#[derive(Debug)]
pub struct OutboundResponse<'a> {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: ResponseBody<'a>,
}

impl<'a> OutboundResponse<'a> {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            headers: JSON_HEADERS.to_vec(),
            body: ResponseBody::Json(encode_json(value)),
        }
    }

    pub fn error(error: &ChatError) -> Self {
        Self::json(error.status_code(), &ErrorEnvelope::from(error))
    }

    pub fn sse(stream: SseStream<'a>) -> Self {
        Self {
            status: 200,
            headers: SSE_HEADERS.to_vec(),
            body: ResponseBody::Sse(stream),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Sse(_))
    }

    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    /// Reads the whole body, draining the SSE stream if there is one.
    pub async fn collect_body(self) -> Bytes {
        match self.body {
            ResponseBody::Json(bytes) => bytes,
            ResponseBody::Sse(stream) => {
                let frames = stream.collect::<Vec<_>>().await;
                Bytes::from(frames.concat())
            }
        }
    }
}

/// Turns a chat event stream into an outbound response.
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    framer: ChunkFramer,
}

impl ResponseAssembler {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_framer(ChunkFramer::new(model))
    }

    pub fn with_framer(framer: ChunkFramer) -> Self {
        Self { framer }
    }

    /// Streaming responses wait for the first event so that failures before any output
    /// (credentials, normalization, upstream status) still get a proper HTTP status.
    pub async fn respond<'a>(
        self,
        mut events: ChatEventStream<'a>,
        streaming: bool,
    ) -> OutboundResponse<'a> {
        if !streaming {
            return self.unary(events).await;
        }

        match events.next().await {
            Some(Err(error)) => OutboundResponse::error(&error),
            Some(Ok(first)) => {
                let events = Box::pin(futures_util::stream::once(async move { Ok(first) }).chain(events));
                OutboundResponse::sse(self.sse(events))
            }
            None => OutboundResponse::error(&ended_without_outcome()),
        }
    }

    /// Lazily frames each event; an error becomes one error event and no `[DONE]`.
    ///
    /// Every stream ends with either `[DONE]` or an error event, including one whose
    /// events run out before `Completed`.
    pub fn sse<'a>(self, mut events: ChatEventStream<'a>) -> SseStream<'a> {
        let mut framer = self.framer;
        Box::pin(stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(ChatEvent::TextDelta(text)) => yield encode_sse(&framer.text_chunk(text)),
                    Ok(ChatEvent::Completed(outcome)) => {
                        yield encode_sse(&framer.finish_chunk(&outcome.finish_reason));
                        yield Bytes::from_static(SSE_DONE);
                        return;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        yield encode_sse(&ErrorEnvelope::from(&error));
                        return;
                    }
                }
            }

            yield encode_sse(&ErrorEnvelope::from(&ended_without_outcome()));
        })
    }

    pub async fn unary<'a>(mut self, mut events: ChatEventStream<'a>) -> OutboundResponse<'a> {
        while let Some(event) = events.next().await {
            match event {
                Ok(ChatEvent::Completed(outcome)) => {
                    return OutboundResponse::json(200, &self.framer.completion(&outcome));
                }
                Ok(_) => {}
                Err(error) => return OutboundResponse::error(&error),
            }
        }

        OutboundResponse::error(&ended_without_outcome())
    }
}

fn ended_without_outcome() -> ChatError {
    ChatError::other("chat stream ended without an outcome")
        .with_phase(ChatErrorPhase::Orchestration)
}
