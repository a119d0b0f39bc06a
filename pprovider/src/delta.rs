//! Normalized delta protocol emitted by every stream decoder.
//!
//! ```rust
//! use pprovider::{DeltaStream, FinishReason, NormalizedDelta, VecDeltaStream};
//!
//! let stream = VecDeltaStream::new(vec![
//!     NormalizedDelta::text("hello"),
//!     NormalizedDelta::finish(FinishReason::Stop),
//! ]);
//! let _boxed: DeltaStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, TokenUsage};

/// Partial tool call. Fragments sharing an `id` are concatenated in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub id: String,
    pub name: Option<String>,
    pub arguments: String,
}

impl ToolCallFragment {
    pub fn new(id: impl Into<String>, name: Option<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name,
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    Blocked(String),
    Error(ProviderError),
}

impl FinishReason {
    /// OpenAI-compatible `finish_reason` string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::Blocked(_) => "content_filter",
            Self::Error(_) => "error",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Blocked(_) | Self::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedDelta {
    pub text: Option<String>,
    pub tool_call_fragments: Vec<ToolCallFragment>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<TokenUsage>,
}

impl NormalizedDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn fragment(fragment: ToolCallFragment) -> Self {
        Self {
            tool_call_fragments: vec![fragment],
            ..Self::default()
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }

    pub fn error(error: ProviderError) -> Self {
        Self::finish(FinishReason::Error(error))
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
            && self.tool_call_fragments.is_empty()
            && self.finish_reason.is_none()
            && self.usage.is_none()
    }
}

/// Decoder output contract.
///
/// - Deltas are emitted in source order and the stream is finite.
/// - At most one delta carries a `finish_reason`, and nothing follows it.
/// - Provider failures are reported in-band as `FinishReason::Error`.
pub type DeltaStream<'a> = Pin<Box<dyn Stream<Item = NormalizedDelta> + Send + 'a>>;

#[derive(Debug)]
pub struct VecDeltaStream {
    deltas: VecDeque<NormalizedDelta>,
}

impl VecDeltaStream {
    pub fn new(deltas: Vec<NormalizedDelta>) -> Self {
        Self {
            deltas: deltas.into(),
        }
    }
}

impl Stream for VecDeltaStream {
    type Item = NormalizedDelta;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<NormalizedDelta>> {
        Poll::Ready(self.deltas.pop_front())
    }
}
