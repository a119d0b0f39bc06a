//! Provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::{ProviderError, ProviderErrorKind};
//!
//! let missing = ProviderError::missing_credential("no key");
//! assert_eq!(missing.kind, ProviderErrorKind::MissingCredential);
//! assert!(!missing.retryable);
//!
//! let upstream = ProviderError::transport("bad gateway").with_status(502);
//! assert_eq!(upstream.status, Some(502));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    MissingCredential,
    UnsupportedContent,
    InvalidRequest,
    Blocked,
    Timeout,
    Transport,
    Decode,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Upstream HTTP status, when the failure came from a provider response.
    pub status: Option<u16>,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retryable,
        }
    }

    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MissingCredential, message, false)
    }

    pub fn unsupported_content(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::UnsupportedContent, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Blocked, reason, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Decode, message, false)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Cancelled, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Errors that end the whole invocation rather than a single event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, ProviderErrorKind::Decode)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} [status={}]: {}", self.kind, status, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}
