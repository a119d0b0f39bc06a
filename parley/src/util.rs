//! Small convenience constructors for common types.

use crate::{ChatMessage, ChatRequest, ProviderError, ProviderId, Role};

pub fn system_message(text: impl Into<String>) -> ChatMessage {
    ChatMessage::new(Role::System, text)
}

pub fn user_message(text: impl Into<String>) -> ChatMessage {
    ChatMessage::new(Role::User, text)
}

pub fn assistant_message(text: impl Into<String>) -> ChatMessage {
    ChatMessage::new(Role::Assistant, text)
}

pub fn request(
    model: impl Into<String>,
    messages: impl IntoIterator<Item = ChatMessage>,
) -> Result<ChatRequest, ProviderError> {
    ChatRequest::builder(model).messages(messages).build()
}

pub fn streaming_request(
    model: impl Into<String>,
    messages: impl IntoIterator<Item = ChatMessage>,
) -> Result<ChatRequest, ProviderError> {
    ChatRequest::builder(model)
        .messages(messages)
        .enable_streaming()
        .build()
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" | "gemini-pro" => Some(ProviderId::Gemini),
        _ => None,
    }
}
