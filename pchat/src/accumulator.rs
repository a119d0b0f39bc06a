//! Keyed accumulation of streamed tool-call fragments.
//!
//! ```rust
//! use pchat::ToolCallAccumulator;
//! use pprovider::ToolCallFragment;
//!
//! let mut accumulator = ToolCallAccumulator::new();
//! accumulator.push(ToolCallFragment::new("t1", Some("search".to_string()), "{\"q"));
//! accumulator.push(ToolCallFragment::new("t1", None, "\":\"x\"}"));
//!
//! let calls = accumulator.finalize();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].arguments, r#"{"q":"x"}"#);
//! ```

use indexmap::IndexMap;
use pprovider::{ToolCall, ToolCallFragment};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PartialCall {
    name: Option<String>,
    arguments: String,
}

/// Fragments are grouped by call id in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    calls: IndexMap<String, PartialCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: ToolCallFragment) {
        let entry = self.calls.entry(fragment.id).or_default();
        if let Some(name) = fragment.name.filter(|name| !name.is_empty()) {
            entry.name = Some(name);
        }
        entry.arguments.push_str(&fragment.arguments);
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = ToolCallFragment>) {
        for fragment in fragments {
            self.push(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Complete calls in first-seen order.
    ///
    /// Calls without a name or whose arguments are not valid JSON are dropped; empty
    /// arguments become `{}`.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter_map(|(id, partial)| {
                let name = partial.name?;
                let arguments = if partial.arguments.trim().is_empty() {
                    "{}".to_string()
                } else {
                    partial.arguments
                };

                match serde_json::from_str::<serde_json::Value>(&arguments) {
                    Ok(_) => Some(ToolCall::new(id, name, arguments)),
                    Err(err) => {
                        tracing::warn!(
                            tool_call_id = %id,
                            tool_name = %name,
                            error = %err,
                            "dropping tool call with incomplete arguments"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
