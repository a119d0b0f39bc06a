//! Gemini transport trait, endpoint construction and the reqwest implementation.

use futures_util::StreamExt;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};

use crate::{ByteStream, ProviderError, ProviderFuture, RawResponse};

use super::types::{GeminiRequest, extract_error_message};

pub const API_VERSION: &str = "v1beta";

pub struct TransportRequest {
    pub endpoint: String,
    pub api_key: SecretString,
    pub body: GeminiRequest,
    pub streaming: bool,
}

impl std::fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRequest")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

/// Sends one request and hands back the status plus the unread body.
///
/// Implementations surface non-2xx responses as `Transport` errors carrying the status.
/// Deadlines and cancellation are applied by the caller.
pub trait GeminiTransport: Send + Sync + std::fmt::Debug {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> ProviderFuture<'a, Result<RawResponse, ProviderError>>;
}

/// `{base}/v1beta/models/{model}:generateContent`, or the streaming variant with `alt=sse`.
pub fn build_endpoint(base_url: &str, model: &str, streaming: bool) -> String {
    let base = base_url.trim_end_matches('/');
    let method = if streaming {
        "streamGenerateContent"
    } else {
        "generateContent"
    };

    let mut endpoint = format!("{base}/{API_VERSION}/models/{model}:{method}");
    if streaming {
        endpoint.push(if endpoint.contains('?') { '&' } else { '?' });
        endpoint.push_str("alt=sse");
    }

    endpoint
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
}

impl GeminiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("Gemini request failed with status {status}"));

        ProviderError::transport(message).with_status(status.as_u16())
    }
}

impl Default for GeminiHttpTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl GeminiTransport for GeminiHttpTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> ProviderFuture<'a, Result<RawResponse, ProviderError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .post(&request.endpoint)
                .header("x-goog-api-key", request.api_key.expose_secret())
                .json(&request.body);
            if request.streaming {
                builder = builder.header(http::header::ACCEPT, "text/event-stream");
            }

            let response = builder.send().await.map_err(|err| {
                if err.is_timeout() {
                    ProviderError::timeout(err.to_string())
                } else {
                    ProviderError::transport(err.to_string())
                }
            })?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let status = response.status().as_u16();
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|err| ProviderError::transport(err.to_string())));

            Ok(RawResponse::new(status, Box::pin(body) as ByteStream<'static>))
        })
    }
}
