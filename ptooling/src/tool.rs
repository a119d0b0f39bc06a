//! Handlers the gateway can run when the model requests a declared tool.
//!
//! A handler only ever sees arguments that parsed and matched the declaration the model
//! was given, so it reads fields instead of re-validating them.
//!
//! ```rust
//! use pprovider::ToolDeclaration;
//! use ptooling::{FunctionTool, Tool, ToolError, required_str};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolDeclaration::new("echo", "Echoes its text", json!({"type": "object"})),
//!     |args, _ctx| async move { Ok::<_, ToolError>(required_str(&args, "text")?.to_string()) },
//! );
//!
//! assert_eq!(tool.declaration().name, "echo");
//! ```

use std::future::Future;

use pcommon::BoxFuture;
use pprovider::ToolDeclaration;
use serde_json::Value;

use crate::{ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    /// Declaration registered for this handler; its name is the registry key.
    fn declaration(&self) -> &ToolDeclaration;

    /// Output text is returned to the model verbatim as the function response.
    fn invoke<'a>(
        &'a self,
        arguments: Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>>;
}

type ToolHandler =
    dyn Fn(Value, ToolExecutionContext) -> ToolFuture<'static, Result<String, ToolError>> + Send + Sync;

/// Closure-backed tool; the usual way to register a handler.
pub struct FunctionTool {
    declaration: ToolDeclaration,
    handler: Box<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(declaration: ToolDeclaration, handler: F) -> Self
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            declaration,
            handler: Box::new(move |arguments, context| Box::pin(handler(arguments, context))),
        }
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.declaration.name)
            .finish_non_exhaustive()
    }
}

impl Tool for FunctionTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn invoke<'a>(
        &'a self,
        arguments: Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        (self.handler)(arguments, context.clone())
    }
}
