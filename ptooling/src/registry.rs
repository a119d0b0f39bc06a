//! Handlers available to the gateway, keyed by the tool name the model calls.

use std::future::Future;

use pcommon::Registry;
use pprovider::ToolDeclaration;
use serde_json::Value;

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext};

/// Requests still have to declare a tool for the model to call it; registering only
/// provides the handler.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its declared name, returning any handler it replaces.
    pub fn register<T>(&mut self, tool: T) -> Option<Box<dyn Tool>>
    where
        T: Tool + 'static,
    {
        let name = tool.declaration().name.clone();
        self.tools.insert(name, Box::new(tool))
    }

    pub fn register_fn<F, Fut>(&mut self, declaration: ToolDeclaration, handler: F)
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(declaration, handler));
    }

    pub fn register_sync_fn<F>(&mut self, declaration: ToolDeclaration, handler: F)
    where
        F: Fn(Value, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(declaration, move |arguments, context| {
            let output = handler(arguments, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self
            .tools
            .values()
            .map(|tool| tool.declaration().name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
