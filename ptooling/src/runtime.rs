//! Runs model-requested tool calls against registered handlers.

use std::sync::Arc;
use std::time::Instant;

use pprovider::{ToolCall, ToolDeclaration};

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolExecutionContext, ToolExecutionResult, ToolFuture,
    ToolRegistry, ToolRuntimeHooks, check_call,
};

pub trait ToolRuntime: Send + Sync {
    /// `declaration` is the one the request gave the model for `tool_call.name`, if any.
    ///
    /// Errors are tagged with the call and are meant to be returned to the model.
    fn execute<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        declaration: Option<&'a ToolDeclaration>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    fn reject(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: ToolError,
    ) -> Result<ToolExecutionResult, ToolError> {
        self.hooks.on_call_rejected(tool_call, context, &error);
        Err(error)
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn execute<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        declaration: Option<&'a ToolDeclaration>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            let arguments = match check_call(tool_call, declaration) {
                Ok(arguments) => arguments,
                Err(error) => return self.reject(tool_call, context, error),
            };

            let Some(tool) = self.registry.get(&tool_call.name) else {
                let error = ToolError::unregistered(&tool_call.name).for_call(tool_call);
                return self.reject(tool_call, context, error);
            };

            self.hooks.on_dispatch_start(tool_call, context);
            let started = Instant::now();
            let outcome = tool
                .invoke(arguments, context)
                .await
                .map(|output| ToolExecutionResult::new(tool_call.id.clone(), output))
                .map_err(|error| error.for_call(tool_call));
            self.hooks
                .on_dispatch_end(tool_call, context, outcome.as_ref(), started.elapsed());
            outcome
        })
    }
}
