//! Canonical conversation to Gemini `contents` translation.
//!
//! Gemini rejects adjacent turns that share a role, has no `system` or `assistant`
//! roles, and expects every `functionCall` turn to be followed by its
//! `functionResponse` turns. All of that is resolved here.

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::{ChatMessage, ChatRequest, Conversation, ProviderError, Role, ToolCall};

use super::types::{
    GeminiContent, GeminiFunctionCall, GeminiFunctionDeclaration, GeminiFunctionResponse,
    GeminiGenerationConfig, GeminiInlineData, GeminiPart, GeminiRequest, GeminiRole,
    GeminiSafetySetting, GeminiTool,
};

pub fn normalize(request: &ChatRequest, vision: bool) -> Result<GeminiRequest, ProviderError> {
    let contents = merge_adjacent(conversation_turns(&request.conversation, vision)?);

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(vec![GeminiTool {
            function_declarations: request
                .tools
                .iter()
                .map(|tool| GeminiFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }])
    };

    let options = &request.config.options;
    let generation_config = GeminiGenerationConfig {
        temperature: options.temperature,
        max_output_tokens: options.max_output_tokens,
        top_p: options.top_p,
        top_k: options.top_k,
    };
    let generation_config = (generation_config != GeminiGenerationConfig::default())
        .then_some(generation_config);

    let safety_settings = request
        .config
        .safety
        .settings()
        .iter()
        .map(|(category, threshold)| GeminiSafetySetting {
            category: category.as_str().to_string(),
            threshold: threshold.as_str().to_string(),
        })
        .collect();

    Ok(GeminiRequest {
        contents,
        tools,
        generation_config,
        safety_settings,
    })
}

pub fn gemini_role(role: Role) -> GeminiRole {
    match role {
        Role::User | Role::System => GeminiRole::User,
        Role::Assistant => GeminiRole::Model,
        Role::Tool => GeminiRole::Function,
    }
}

/// Folds turns left to right, appending a turn's parts to its predecessor when both
/// share a role. The output never has two adjacent turns with the same role.
pub fn merge_adjacent(turns: Vec<GeminiContent>) -> Vec<GeminiContent> {
    turns
        .into_iter()
        .fold(Vec::<GeminiContent>::new(), |mut merged, turn| {
            match merged.last_mut() {
                Some(previous) if previous.role == turn.role => previous.parts.extend(turn.parts),
                _ => merged.push(turn),
            }
            merged
        })
}

/// Splits `data:<mime>;<encoding>,<payload>` into Gemini inline data.
pub fn parse_data_uri(uri: &str) -> Result<GeminiInlineData, ProviderError> {
    let unsupported = || {
        let preview = uri.chars().take(32).collect::<String>();
        ProviderError::unsupported_content(format!("unsupported image reference '{preview}'"))
    };

    let rest = uri.trim().strip_prefix("data:").ok_or_else(unsupported)?;
    let (header, data) = rest.split_once(',').ok_or_else(unsupported)?;
    let (mime_type, _) = header.split_once(';').ok_or_else(unsupported)?;

    if mime_type.trim().is_empty() || data.is_empty() {
        return Err(unsupported());
    }

    Ok(GeminiInlineData {
        mime_type: mime_type.trim().to_string(),
        data: data.to_string(),
    })
}

fn conversation_turns(
    conversation: &Conversation,
    vision: bool,
) -> Result<Vec<GeminiContent>, ProviderError> {
    let messages = conversation.messages();
    let mut consumed = HashSet::new();
    let mut turns = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }

        match message.role {
            Role::Assistant if message.has_tool_calls() => {
                turns.push(tool_call_turn(message, vision)?);

                for call in &message.tool_calls {
                    let result = messages
                        .iter()
                        .enumerate()
                        .skip(index + 1)
                        .find(|(candidate, result)| {
                            result.role == Role::Tool
                                && !consumed.contains(candidate)
                                && result.tool_call_id.as_deref() == Some(call.id.as_str())
                        });

                    match result {
                        Some((result_index, result)) => {
                            consumed.insert(result_index);
                            turns.push(function_response_turn(result, Some(call)));
                        }
                        None => tracing::debug!(
                            tool_call_id = call.id,
                            tool_name = call.name,
                            "tool call has no matching result message"
                        ),
                    }
                }
            }
            Role::Tool => turns.push(function_response_turn(message, None)),
            _ => turns.push(GeminiContent::new(
                gemini_role(message.role),
                message_parts(message, vision, true)?,
            )),
        }
    }

    Ok(turns)
}

fn message_parts(
    message: &ChatMessage,
    vision: bool,
    always_text: bool,
) -> Result<Vec<GeminiPart>, ProviderError> {
    let mut parts = Vec::with_capacity(1 + message.images.len());
    if always_text || !message.text.is_empty() {
        parts.push(GeminiPart::text(message.text.clone()));
    }

    if vision {
        for image in &message.images {
            parts.push(GeminiPart::inline_data(parse_data_uri(image)?));
        }
    }

    Ok(parts)
}

fn tool_call_turn(message: &ChatMessage, vision: bool) -> Result<GeminiContent, ProviderError> {
    let mut parts = message_parts(message, vision, false)?;
    for call in &message.tool_calls {
        parts.push(GeminiPart::function_call(GeminiFunctionCall {
            id: None,
            name: call.name.clone(),
            args: call_arguments(call)?,
        }));
    }

    Ok(GeminiContent::new(GeminiRole::Model, parts))
}

fn call_arguments(call: &ToolCall) -> Result<Value, ProviderError> {
    if call.arguments.trim().is_empty() {
        return Ok(json!({}));
    }

    serde_json::from_str(&call.arguments).map_err(|err| {
        ProviderError::unsupported_content(format!(
            "tool call '{}' has invalid JSON arguments: {err}",
            call.id
        ))
    })
}

fn function_response_turn(message: &ChatMessage, call: Option<&ToolCall>) -> GeminiContent {
    let name = message
        .name
        .clone()
        .or_else(|| call.map(|call| call.name.clone()))
        .or_else(|| message.tool_call_id.clone())
        .unwrap_or_default();

    GeminiContent::new(
        GeminiRole::Function,
        vec![GeminiPart::function_response(GeminiFunctionResponse {
            name: name.clone(),
            response: json!({ "name": name, "content": message.text }),
        })],
    )
}
