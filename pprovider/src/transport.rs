//! Provider-agnostic raw response contract plus deadline and cancellation guards.
//!
//! ```rust
//! use bytes::Bytes;
//! use futures_util::stream;
//! use pprovider::{ByteStream, RawResponse};
//!
//! let body: ByteStream<'static> = Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"{}"))]));
//! let response = RawResponse::new(200, body);
//! assert!(response.is_success());
//! ```

use std::future::Future;
use std::pin::Pin;

use async_stream::stream;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::ProviderError;

pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send + 'a>>;

pub struct RawResponse {
    pub status: u16,
    pub body: ByteStream<'static>,
}

impl RawResponse {
    pub fn new(status: u16, body: ByteStream<'static>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Resolves `operation` unless the deadline passes or the token is cancelled first.
/// Losing the race drops the operation, which releases its connection.
pub async fn run_guarded<T, F>(
    operation: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::cancelled("request cancelled")),
        _ = sleep_until(deadline) => Err(ProviderError::timeout("request deadline exceeded")),
        result = operation => result,
    }
}

/// Wraps a response body so every read races the same deadline and token.
/// The stream ends after the first error it yields.
pub fn guard_body(
    mut body: ByteStream<'static>,
    deadline: Instant,
    cancel: CancellationToken,
) -> ByteStream<'static> {
    Box::pin(stream! {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Some(Err(ProviderError::cancelled("request cancelled"))),
                _ = sleep_until(deadline) => {
                    Some(Err(ProviderError::timeout("response deadline exceeded")))
                }
                chunk = body.next() => chunk,
            };

            match next {
                Some(Ok(chunk)) => yield Ok(chunk),
                Some(Err(error)) => {
                    yield Err(error);
                    break;
                }
                None => break,
            }
        }
    })
}
