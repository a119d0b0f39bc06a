use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::{ChatRequest, DeltaStream, ProviderError};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Gemini => "gemini",
        };

        f.write_str(id)
    }
}

/// Per-invocation call state shared by every continuation cycle.
#[derive(Clone, Default)]
pub struct CallContext {
    pub request_key: Option<SecretString>,
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            request_key: None,
            cancel,
        }
    }

    pub fn with_request_key(mut self, request_key: Option<SecretString>) -> Self {
        self.request_key = request_key;
        self
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("request_key", &self.request_key.as_ref().map(|_| "[REDACTED]"))
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Runs one generation cycle.
    ///
    /// Failures that happen before the first byte (credentials, normalization, HTTP status,
    /// deadline, cancellation) are returned as `Err`; failures after that are reported
    /// in-band through the delta stream.
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
        context: CallContext,
    ) -> ProviderFuture<'a, Result<DeltaStream<'a>, ProviderError>>;
}
