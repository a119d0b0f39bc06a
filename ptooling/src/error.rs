//! Why a model-requested tool call produced a failed result instead of output.
//!
//! None of these abort an invocation: each becomes a `ToolResult` with `is_error` set,
//! returned to the model on the next cycle.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{ToolCall, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// The model named a tool the request never declared.
    Undeclared,
    /// Declared in the request, but no handler is registered for it.
    Unregistered,
    InvalidArguments,
    /// The declaration's parameter schema does not compile.
    InvalidSchema,
    Execution,
    /// The gateway was built without a tool runtime.
    Unavailable,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undeclared => "undeclared",
            Self::Unregistered => "unregistered",
            Self::InvalidArguments => "invalid_arguments",
            Self::InvalidSchema => "invalid_schema",
            Self::Execution => "execution",
            Self::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn undeclared(tool_name: &str) -> Self {
        Self::new(
            ToolErrorKind::Undeclared,
            format!("tool '{tool_name}' was not declared"),
        )
    }

    pub fn unregistered(tool_name: &str) -> Self {
        Self::new(
            ToolErrorKind::Unregistered,
            format!("tool '{tool_name}' has no registered handler"),
        )
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidSchema, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    pub fn unavailable() -> Self {
        Self::new(
            ToolErrorKind::Unavailable,
            "tool execution is not configured",
        )
    }

    /// Tags the error with the call it belongs to.
    pub fn for_call(mut self, call: &ToolCall) -> Self {
        self.tool_name = Some(call.name.clone());
        self.tool_call_id = Some(call.id.clone());
        self
    }

    /// The model asked for something it could correct on the next cycle.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::Undeclared | ToolErrorKind::InvalidArguments
        )
    }

    /// Failed result fed back to the model in place of tool output.
    pub fn into_tool_result(self, call: &ToolCall) -> ToolResult {
        ToolResult::failure(call, self.message)
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind.as_str();
        match (&self.tool_name, &self.tool_call_id) {
            (Some(tool_name), Some(tool_call_id)) => write!(
                f,
                "{kind} [tool={tool_name}, call_id={tool_call_id}]: {}",
                self.message
            ),
            _ => write!(f, "{kind}: {}", self.message),
        }
    }
}

impl Error for ToolError {}
