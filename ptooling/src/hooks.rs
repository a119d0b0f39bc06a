//! Observation points around one model-requested tool call.
//!
//! A call is either rejected before it reaches a handler or dispatched; only dispatched
//! calls report an outcome and elapsed time.
//!
//! ```rust
//! use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! accepts_tool_hooks(&NoopToolRuntimeHooks);
//! ```

use std::time::Duration;

use pprovider::ToolCall;

use crate::{ToolError, ToolExecutionContext, ToolExecutionResult};

pub trait ToolRuntimeHooks: Send + Sync {
    /// Undeclared tool, bad arguments, bad schema or missing handler. Nothing ran.
    fn on_call_rejected(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
    ) {
    }

    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_dispatch_end(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: Result<&ToolExecutionResult, &ToolError>,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
