//! Lifecycle hooks for the tool-call loop.
//!
//! ```rust
//! use pchat::{ChatLoopHooks, NoopChatLoopHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ChatLoopHooks) {}
//!
//! assert_hooks_trait(&NoopChatLoopHooks);
//! ```

use pcommon::InvocationId;

use crate::{ChatError, ChatOutcome};

pub trait ChatLoopHooks: Send + Sync {
    fn on_cycle_start(&self, _invocation: &InvocationId, _model: &str, _cycle: u32) {}

    fn on_tool_phase(&self, _invocation: &InvocationId, _cycle: u32, _tool_calls: usize) {}

    fn on_complete(&self, _invocation: &InvocationId, _outcome: &ChatOutcome) {}

    fn on_failure(&self, _invocation: &InvocationId, _error: &ChatError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatLoopHooks;

impl ChatLoopHooks for NoopChatLoopHooks {}
