//! Registering, checking and running the tools a model may call mid-conversation.

mod args;
mod error;
mod hooks;
mod registry;
mod runtime;
mod tool;
mod types;
mod validate;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, FunctionTool, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolFuture, ToolRegistry, ToolRuntime, ToolRuntimeHooks,
        optional_str, required_str,
    };
}

pub use args::{optional_str, parse_arguments, required_str};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult};
pub use validate::{check_call, validate_arguments};
