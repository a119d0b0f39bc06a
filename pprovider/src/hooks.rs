//! Provider operation hooks and the single-attempt observation helper.
//!
//! Failed provider calls are never retried here; the hooks only observe the
//! outcome of each transport call.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{ProviderError, ProviderId};

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _model: &str) {}

    fn on_success(&self, _provider: ProviderId, _operation: &str, _model: &str, _elapsed: Duration) {
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

pub async fn observe_operation<T, F>(
    provider: ProviderId,
    operation: &str,
    model: &str,
    hooks: &dyn ProviderOperationHooks,
    operation_future: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    hooks.on_attempt_start(provider, operation, model);
    let started = Instant::now();

    match operation_future.await {
        Ok(value) => {
            hooks.on_success(provider, operation, model, started.elapsed());
            Ok(value)
        }
        Err(error) => {
            hooks.on_failure(provider, operation, model, &error, started.elapsed());
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::ProviderErrorKind;

    #[derive(Default)]
    struct RecordingHooks {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl ProviderOperationHooks for RecordingHooks {
        fn on_attempt_start(&self, _provider: ProviderId, operation: &str, model: &str) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("start:{operation}:{model}"));
        }

        fn on_success(&self, _provider: ProviderId, operation: &str, _model: &str, _elapsed: Duration) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("success:{operation}"));
        }

        fn on_failure(
            &self,
            _provider: ProviderId,
            operation: &str,
            _model: &str,
            error: &ProviderError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("failure:{operation}:{:?}", error.kind));
        }
    }

    #[tokio::test]
    async fn observe_operation_reports_success() {
        let hooks = RecordingHooks::default();
        let value = observe_operation(
            ProviderId::Gemini,
            "generate",
            "gemini-pro",
            &hooks,
            async { Ok::<_, ProviderError>(7) },
        )
        .await
        .expect("operation should succeed");

        assert_eq!(value, 7);
        let events = hooks.events.lock().expect("events lock");
        assert_eq!(
            events.as_slice(),
            ["start:generate:gemini-pro", "success:generate"]
        );
    }

    #[tokio::test]
    async fn observe_operation_reports_failure_without_retrying() {
        let hooks = RecordingHooks::default();
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);

        let error = observe_operation(
            ProviderId::Gemini,
            "stream_generate",
            "gemini-pro",
            &hooks,
            async move {
                *counter.lock().expect("calls lock") += 1;
                Err::<(), _>(ProviderError::timeout("deadline exceeded"))
            },
        )
        .await
        .expect_err("operation should fail");

        assert_eq!(error.kind, ProviderErrorKind::Timeout);
        assert_eq!(*calls.lock().expect("calls lock"), 1);
        let events = hooks.events.lock().expect("events lock");
        assert_eq!(events.last().map(String::as_str), Some("failure:stream_generate:Timeout"));
    }
}
