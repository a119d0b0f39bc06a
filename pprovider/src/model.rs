//! Canonical, provider-agnostic conversation model.
//!
//! ```rust
//! use pprovider::{ChatMessage, ChatRequest, Role};
//!
//! let request = ChatRequest::builder("gemini-1.5-flash")
//!     .message(ChatMessage::system("Be brief."))
//!     .message(ChatMessage::user("hello"))
//!     .temperature(0.4)
//!     .enable_streaming()
//!     .build()
//!     .expect("request should be valid");
//!
//! assert_eq!(request.conversation.len(), 2);
//! assert_eq!(request.conversation.messages()[0].role, Role::System);
//! assert!(request.config.options.stream);
//! ```

use std::collections::HashSet;

use pcommon::GenerationOptions;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" | "model" => Some(Self::Assistant),
            "tool" | "function" => Some(Self::Tool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema describing the call arguments.
    pub parameters: serde_json::Value,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A complete tool invocation; `arguments` is a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(call: &ToolCall, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: message.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Inline images as `data:<mime>;base64,<payload>` URIs.
    pub images: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_call_id: Option<String>,
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            images: Vec::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn assistant_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, text)
        }
    }

    pub fn tool_result(result: &ToolResult) -> Self {
        Self {
            tool_call_id: Some(result.tool_call_id.clone()),
            name: Some(result.name.clone()),
            ..Self::new(Role::Tool, result.content.clone())
        }
    }

    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.images.push(data_uri.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images.extend(images);
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Ordered message history. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    /// Appends an assistant tool-call turn followed by its results in call order.
    pub fn append_tool_round(
        &mut self,
        text: impl Into<String>,
        calls: Vec<ToolCall>,
        results: &[ToolResult],
    ) {
        self.push(ChatMessage::assistant_tool_calls(text, calls));
        self.extend(results.iter().map(ChatMessage::tool_result));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<ChatMessage>> for Conversation {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        Self::Harassment,
        Self::HateSpeech,
        Self::SexuallyExplicit,
        Self::DangerousContent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "HARM_CATEGORY_HARASSMENT",
            Self::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            Self::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            Self::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HarmBlockThreshold {
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl HarmBlockThreshold {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockNone => "BLOCK_NONE",
            Self::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            Self::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            Self::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BLOCK_NONE" => Some(Self::BlockNone),
            "BLOCK_ONLY_HIGH" => Some(Self::BlockOnlyHigh),
            "BLOCK_MEDIUM_AND_ABOVE" => Some(Self::BlockMediumAndAbove),
            "BLOCK_LOW_AND_ABOVE" => Some(Self::BlockLowAndAbove),
            _ => None,
        }
    }
}

/// Per-category block thresholds. The default disables blocking for every category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    settings: Vec<(HarmCategory, HarmBlockThreshold)>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            settings: HarmCategory::ALL
                .into_iter()
                .map(|category| (category, HarmBlockThreshold::BlockNone))
                .collect(),
        }
    }
}

impl SafetyPolicy {
    pub fn with_threshold(mut self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        match self.settings.iter_mut().find(|(existing, _)| *existing == category) {
            Some(entry) => entry.1 = threshold,
            None => self.settings.push((category, threshold)),
        }
        self
    }

    pub fn threshold(&self, category: HarmCategory) -> Option<HarmBlockThreshold> {
        self.settings
            .iter()
            .find(|(existing, _)| *existing == category)
            .map(|(_, threshold)| *threshold)
    }

    pub fn settings(&self) -> &[(HarmCategory, HarmBlockThreshold)] {
        &self.settings
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub options: GenerationOptions,
    pub safety: SafetyPolicy,
}

impl GenerationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: GenerationOptions::default(),
            safety: SafetyPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Sums per-cycle usage; counts saturate at `u32::MAX`.
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub config: GenerationConfig,
    pub conversation: Conversation,
    pub tools: Vec<ToolDeclaration>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, conversation: impl Into<Conversation>) -> Self {
        Self {
            config: GenerationConfig::new(model),
            conversation: conversation.into(),
            tools: Vec::new(),
        }
    }

    pub fn builder(model: impl Into<String>) -> ChatRequestBuilder {
        ChatRequestBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_streaming(&self) -> bool {
        self.config.options.stream
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.config.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.conversation.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        let options = &self.config.options;
        if let Some(temperature) = options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProviderError::invalid_request(
                    "temperature must be in the inclusive range 0.0..=2.0",
                ));
            }
        }

        if let Some(top_p) = options.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ProviderError::invalid_request(
                    "top_p must be in the inclusive range 0.0..=1.0",
                ));
            }
        }

        if options.max_output_tokens == Some(0) {
            return Err(ProviderError::invalid_request(
                "max_output_tokens must be greater than zero",
            ));
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(ProviderError::invalid_request("tool name must not be empty"));
            }

            if !seen.insert(tool.name.as_str()) {
                return Err(ProviderError::invalid_request(format!(
                    "duplicate tool declaration '{}'",
                    tool.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl ChatRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request: ChatRequest::new(model, Conversation::new()),
        }
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.request.conversation.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.request.conversation.extend(messages);
        self
    }

    pub fn tool(mut self, tool: ToolDeclaration) -> Self {
        self.request.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.request.tools = tools;
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.request.config.options = options;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.config.options.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.request.config.options.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.request.config.options.top_p = Some(top_p);
        self
    }

    pub fn safety(mut self, safety: SafetyPolicy) -> Self {
        self.request.config.safety = safety;
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.request.config.options.stream = true;
        self
    }

    pub fn build(self) -> Result<ChatRequest, ProviderError> {
        self.request.validate()?;
        Ok(self.request)
    }
}
