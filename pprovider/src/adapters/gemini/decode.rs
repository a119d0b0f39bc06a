//! Gemini response decoding into normalized deltas.
//!
//! The streaming decoder reads `alt=sse` events one at a time; the unary decoder reads
//! the whole body and emits exactly one delta. Both always end with a terminal delta.

use async_stream::stream;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::{
    ByteStream, DeltaStream, FinishReason, NormalizedDelta, ProviderError, TokenUsage,
    ToolCallFragment,
};

use super::types::{GeminiResponse, GeminiUsageMetadata};

const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

pub fn decode_stream(body: ByteStream<'static>) -> DeltaStream<'static> {
    Box::pin(stream! {
        let mut events = body.eventsource();
        let mut state = DecodeState::default();

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(EventStreamError::Transport(error)) => {
                    yield NormalizedDelta::error(error);
                    return;
                }
                Err(error) => {
                    tracing::debug!(error = %error, "skipping undecodable Gemini SSE frame");
                    continue;
                }
            };

            let data = event.data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }

            let response = match serde_json::from_str::<GeminiResponse>(data) {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!(error = %err, data = %data, "skipping unparseable Gemini SSE chunk");
                    continue;
                }
            };

            if let Some(delta) = state.apply(response) {
                let terminal = delta.is_terminal();
                yield delta;
                if terminal {
                    return;
                }
            }
        }

        yield state.finish();
    })
}

pub fn decode_unary(mut body: ByteStream<'static>) -> DeltaStream<'static> {
    Box::pin(stream! {
        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => buffer.extend_from_slice(&bytes),
                Err(error) => {
                    yield NormalizedDelta::error(error);
                    return;
                }
            }
        }

        yield unary_delta(&buffer);
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnaryBody {
    Single(GeminiResponse),
    Batch(Vec<GeminiResponse>),
}

fn unary_delta(body: &[u8]) -> NormalizedDelta {
    let responses = match serde_json::from_slice::<UnaryBody>(body) {
        Ok(UnaryBody::Single(response)) => vec![response],
        Ok(UnaryBody::Batch(responses)) => responses,
        Err(err) => {
            return NormalizedDelta::error(ProviderError::decode(format!(
                "invalid Gemini response body: {err}"
            )));
        }
    };

    let mut state = DecodeState::default();
    let mut combined = NormalizedDelta::default();
    let mut text = String::new();

    for response in responses {
        let Some(delta) = state.apply(response) else {
            continue;
        };

        if let Some(fragment) = delta.text {
            text.push_str(&fragment);
        }
        combined.tool_call_fragments.extend(delta.tool_call_fragments);

        if let Some(reason) = delta.finish_reason {
            let failed = reason.is_failure();
            combined.finish_reason = Some(reason);
            if failed {
                break;
            }
        }
    }

    if !text.is_empty() {
        combined.text = Some(text);
    }

    if combined.finish_reason.is_none() {
        combined.finish_reason = state.finish().finish_reason;
    }
    combined.usage = state.usage;
    combined
}

#[derive(Debug, Default)]
struct DecodeState {
    saw_tool_calls: bool,
    usage: Option<TokenUsage>,
}

impl DecodeState {
    fn apply(&mut self, response: GeminiResponse) -> Option<NormalizedDelta> {
        if let Some(usage) = response.usage_metadata {
            self.usage = Some(usage.into());
        }

        if let Some(reason) = response.block_reason() {
            return Some(self.terminal(FinishReason::Blocked(reason.to_string())));
        }

        let candidate = response.candidates.into_iter().next()?;
        let mut delta = NormalizedDelta::default();
        let mut text = String::new();

        for part in candidate.content.map(|content| content.parts).unwrap_or_default() {
            if part.is_thought() {
                continue;
            }

            if let Some(fragment) = part.text {
                text.push_str(&fragment);
            }

            if let Some(call) = part.function_call {
                self.saw_tool_calls = true;
                let arguments = if call.args.is_null() {
                    "{}".to_string()
                } else {
                    call.args.to_string()
                };
                let id = call.id.filter(|id| !id.is_empty()).unwrap_or_else(generate_call_id);
                delta
                    .tool_call_fragments
                    .push(ToolCallFragment::new(id, Some(call.name), arguments));
            }
        }

        if !text.is_empty() {
            delta.text = Some(text);
        }

        if let Some(raw) = candidate.finish_reason.as_deref() {
            delta.finish_reason = Some(self.finish_reason(raw));
            delta.usage = self.usage;
        }

        (!delta.is_empty()).then_some(delta)
    }

    fn finish_reason(&self, raw: &str) -> FinishReason {
        match raw {
            "MAX_TOKENS" => FinishReason::Length,
            "MALFORMED_FUNCTION_CALL" => FinishReason::Error(ProviderError::other(
                "model produced a malformed function call",
            )),
            reason if SAFETY_FINISH_REASONS.contains(&reason) => {
                FinishReason::Blocked(reason.to_string())
            }
            _ if self.saw_tool_calls => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        }
    }

    fn terminal(&self, reason: FinishReason) -> NormalizedDelta {
        let delta = NormalizedDelta::finish(reason);
        match self.usage {
            Some(usage) => delta.with_usage(usage),
            None => delta,
        }
    }

    /// Terminal delta for a body that ended without an explicit finish reason.
    fn finish(&self) -> NormalizedDelta {
        let reason = if self.saw_tool_calls {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        };
        self.terminal(reason)
    }
}

impl From<GeminiUsageMetadata> for TokenUsage {
    fn from(value: GeminiUsageMetadata) -> Self {
        Self {
            input_tokens: value.prompt_token_count,
            output_tokens: value.candidates_token_count,
            total_tokens: value.total_token_count,
        }
    }
}

fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}
