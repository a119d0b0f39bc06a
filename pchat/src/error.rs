//! Chat-layer errors, classification and HTTP status mapping.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{ProviderError, ProviderErrorKind};
use ptooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    MissingCredential,
    UnsupportedContent,
    Blocked,
    Timeout,
    Transport,
    ToolLoopExceeded,
    Cancelled,
    Tooling,
    Other,
}

impl ChatErrorKind {
    /// Stable snake_case code used in error envelopes and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::MissingCredential => "missing_credential",
            Self::UnsupportedContent => "unsupported_content",
            Self::Blocked => "blocked",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::ToolLoopExceeded => "tool_loop_exceeded",
            Self::Cancelled => "cancelled",
            Self::Tooling => "tooling",
            Self::Other => "other",
        }
    }
}

/// Pipeline stage in which an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    Normalize,
    Transport,
    Decode,
    Tooling,
    Orchestration,
}

impl ChatErrorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Tooling => "tooling",
            Self::Orchestration => "orchestration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatErrorPhase>,
    /// Upstream HTTP status, when the provider answered with one.
    pub upstream_status: Option<u16>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
            upstream_status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::MissingCredential, message)
    }

    pub fn unsupported_content(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::UnsupportedContent, message)
    }

    /// `reason` is the provider's block reason, e.g. `SAFETY`.
    pub fn blocked(reason: impl AsRef<str>) -> Self {
        Self::new(
            ChatErrorKind::Blocked,
            format!("Message is being blocked for reason: {}", reason.as_ref()),
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Transport, message)
    }

    pub fn tool_loop_exceeded(limit: u32) -> Self {
        Self::new(
            ChatErrorKind::ToolLoopExceeded,
            format!("tool-call loop exceeded {limit} continuation cycles"),
        )
        .with_phase(ChatErrorPhase::Orchestration)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Other, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_upstream_status(mut self, status: u16) -> Self {
        self.upstream_status = Some(status);
        self
    }

    /// HTTP status for the outbound error envelope.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ChatErrorKind::MissingCredential => 401,
            ChatErrorKind::InvalidRequest | ChatErrorKind::UnsupportedContent => 400,
            ChatErrorKind::Blocked => 403,
            ChatErrorKind::Timeout => 504,
            ChatErrorKind::Transport | ChatErrorKind::ToolLoopExceeded => 502,
            ChatErrorKind::Cancelled => 499,
            ChatErrorKind::Tooling | ChatErrorKind::Other => 500,
        }
    }

    /// OpenAI-style error `type` string.
    pub fn error_type(&self) -> &'static str {
        match self.kind {
            ChatErrorKind::InvalidRequest | ChatErrorKind::UnsupportedContent => {
                "invalid_request_error"
            }
            ChatErrorKind::MissingCredential => "authentication_error",
            ChatErrorKind::Blocked => "content_filter",
            ChatErrorKind::Timeout | ChatErrorKind::Transport => "upstream_error",
            ChatErrorKind::Cancelled => "cancelled",
            ChatErrorKind::ToolLoopExceeded | ChatErrorKind::Tooling | ChatErrorKind::Other => {
                "server_error"
            }
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ChatErrorKind::InvalidRequest
                | ChatErrorKind::MissingCredential
                | ChatErrorKind::UnsupportedContent
                | ChatErrorKind::Blocked
        )
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} [phase={}]: {}", self.kind, phase.as_str(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let (kind, phase) = match value.kind {
            ProviderErrorKind::MissingCredential => {
                (ChatErrorKind::MissingCredential, ChatErrorPhase::Normalize)
            }
            ProviderErrorKind::UnsupportedContent => {
                (ChatErrorKind::UnsupportedContent, ChatErrorPhase::Normalize)
            }
            ProviderErrorKind::InvalidRequest => {
                (ChatErrorKind::InvalidRequest, ChatErrorPhase::Normalize)
            }
            ProviderErrorKind::Blocked => (ChatErrorKind::Blocked, ChatErrorPhase::Decode),
            ProviderErrorKind::Timeout => (ChatErrorKind::Timeout, ChatErrorPhase::Transport),
            ProviderErrorKind::Transport => (ChatErrorKind::Transport, ChatErrorPhase::Transport),
            ProviderErrorKind::Cancelled => (ChatErrorKind::Cancelled, ChatErrorPhase::Transport),
            ProviderErrorKind::Decode => (ChatErrorKind::Other, ChatErrorPhase::Decode),
            ProviderErrorKind::Other => (ChatErrorKind::Other, ChatErrorPhase::Transport),
        };

        let error = if kind == ChatErrorKind::Blocked {
            ChatError::blocked(&value.message)
        } else {
            ChatError::new(kind, value.message)
        };

        let error = error.with_phase(phase);
        match value.status {
            Some(status) => error.with_upstream_status(status),
            None => error,
        }
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string()).with_phase(ChatErrorPhase::Tooling)
    }
}
