//! Retries a fallible async operation with exponential backoff and jitter,
//! short-circuiting on the classifier's first non-retryable verdict.

mod backoff;
mod config;
mod events;

pub use backoff::{ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{ConfigError, RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;

use rsl_classifier::{ClassifiableError, ClassifyContext, ClassifiedError, ErrorClassifier};
use rsl_core::{Cancellation, EventListeners};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("retry cancelled before attempt {attempt}")]
    Cancelled { attempt: u32 },
    #[error(transparent)]
    Failed(#[from] RetryFailure<E>),
}

/// The real cause of a terminal retry failure. `attempts` is always the
/// number of times `op` was actually invoked.
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempt(s): {source}")]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub classified: ClassifiedError,
    #[source]
    pub source: E,
}

pub struct RetryOutcome<T> {
    pub success: bool,
    pub value: Option<T>,
    pub attempts: u32,
    pub total_delay_ms: u64,
    pub errors: Vec<ClassifiedError>,
}

/// Retries `op` per `config`, consulting `classifier` on every failure.
/// `operation_name` is attached to emitted [`RetryEvent`]s. `provider` is
/// forwarded to the classifier so provider-scoped message patterns apply.
/// On success, the second element of the tuple is the number of times `op`
/// was actually invoked (1 if it succeeded on the first try).
pub async fn with_retry<T, E, F, Fut>(
    mut op: F,
    config: &RetryConfig,
    classifier: &ErrorClassifier,
    operation_name: &str,
    provider: Option<&str>,
    cancel: &dyn Cancellation,
    listeners: &EventListeners<RetryEvent>,
) -> Result<(T, u32), RetryError<E>>
where
    E: ClassifiableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let ctx = provider.map(ClassifyContext::for_provider);
    let mut last_classified: Option<ClassifiedError> = None;

    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempt });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(operation_name, attempt, max_attempts = config.max_attempts, "retry attempt starting");

        match op().await {
            Ok(value) => return Ok((value, attempt)),
            Err(err) => {
                let classified = classifier.classify_dyn(&err, ctx.as_ref());
                let retryable = config
                    .should_retry_override(&classified)
                    .unwrap_or_else(|| classified.is_retryable());

                let is_last_attempt = attempt == config.max_attempts;
                if !retryable || is_last_attempt {
                    return Err(RetryFailure {
                        attempts: attempt,
                        classified,
                        source: err,
                    }
                    .into());
                }

                let delay_ms = delay_for(config, attempt - 1, &classified);

                #[cfg(feature = "tracing")]
                tracing::debug!(operation_name, attempt, delay_ms, category = %classified.category(), "retrying after backoff");
                #[cfg(feature = "metrics")]
                metrics::counter!("rsl_retry_attempts_total", "operation" => operation_name.to_string()).increment(1);

                listeners.emit(&RetryEvent::new(operation_name, attempt, config.max_attempts, delay_ms, &classified));
                last_classified = Some(classified);

                if cancel.is_cancelled() {
                    return Err(RetryError::Cancelled { attempt: attempt + 1 });
                }
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
        }
    }

    // Unreachable: max_attempts >= 1 guarantees the loop above returns, but
    // keep the compiler happy and the invariant documented.
    unreachable!(
        "with_retry loop must return within max_attempts; last verdict: {:?}",
        last_classified
    );
}

/// Non-throwing variant of [`with_retry`].
pub async fn with_retry_safe<T, E, F, Fut>(
    mut op: F,
    config: &RetryConfig,
    classifier: &ErrorClassifier,
    operation_name: &str,
    provider: Option<&str>,
    cancel: &dyn Cancellation,
    listeners: &EventListeners<RetryEvent>,
) -> RetryOutcome<T>
where
    E: ClassifiableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let ctx = provider.map(ClassifyContext::for_provider);
    let mut errors = Vec::new();
    let mut total_delay_ms = 0u64;

    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            break;
        }

        match op().await {
            Ok(value) => {
                return RetryOutcome {
                    success: true,
                    value: Some(value),
                    attempts: attempt,
                    total_delay_ms,
                    errors,
                }
            }
            Err(err) => {
                let classified = classifier.classify_dyn(&err, ctx.as_ref());
                let retryable = config
                    .should_retry_override(&classified)
                    .unwrap_or_else(|| classified.is_retryable());
                let is_last_attempt = attempt == config.max_attempts;

                if !retryable || is_last_attempt {
                    errors.push(classified);
                    return RetryOutcome {
                        success: false,
                        value: None,
                        attempts: attempt,
                        total_delay_ms,
                        errors,
                    };
                }

                let delay_ms = delay_for(config, attempt - 1, &classified);
                listeners.emit(&RetryEvent::new(operation_name, attempt, config.max_attempts, delay_ms, &classified));
                errors.push(classified);
                total_delay_ms += delay_ms;

                if cancel.is_cancelled() {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
        }
    }

    RetryOutcome {
        success: false,
        value: None,
        attempts: errors.len() as u32,
        total_delay_ms,
        errors,
    }
}

fn delay_for(config: &RetryConfig, attempt_index: u32, classified: &ClassifiedError) -> u64 {
    // Only a genuine signal (e.g. Retry-After) overrides backoff. A category
    // default (every Timeout/Network/... verdict has one) must not, or the
    // configured backoff curve would never actually run.
    if let Some(explicit) = classified.explicit_delay_ms() {
        return explicit;
    }
    let backoff = ExponentialRandomBackoff {
        initial_delay_ms: config.initial_delay_ms,
        max_delay_ms: config.max_delay_ms,
        multiplier: config.backoff_multiplier,
        jitter_factor: config.jitter_factor,
    };
    backoff.delay_ms(attempt_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsl_classifier::OpaqueError;
    use rsl_core::FnListener;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn retry_then_recover_matches_the_literal_scenario() {
        let config = RetryConfig::builder()
            .max_attempts(3)
            .initial_delay_ms(10)
            .max_delay_ms(50)
            .backoff_multiplier(2.0)
            .jitter_factor(0.0)
            .build()
            .unwrap();
        let classifier = ErrorClassifier::new();
        let mut listeners = EventListeners::new();
        let calls = AtomicU32::new(0);
        let delays = Arc::new(Mutex::new(Vec::new()));
        let recorded = delays.clone();
        listeners.add(FnListener::new(move |event: &RetryEvent| {
            recorded.lock().unwrap().push(event.delay_ms);
        }));

        let result: Result<(&str, u32), RetryError<OpaqueError>> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(OpaqueError::new("timeout"))
                    } else {
                        Ok("ok")
                    }
                }
            },
            &config,
            &classifier,
            "test-op",
            None,
            &(),
            &listeners,
        )
        .await;

        let (value, attempts) = result.unwrap();
        assert_eq!(value, "ok");
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*delays.lock().unwrap(), vec![10, 20]);
    }

    #[tokio::test]
    async fn non_retryable_error_short_circuits_after_one_attempt() {
        let config = RetryConfig::builder().max_attempts(5).build().unwrap();
        let classifier = ErrorClassifier::new();
        let listeners = EventListeners::new();
        let calls = AtomicU32::new(0);

        let result: Result<((), u32), RetryError<rsl_classifier::HttpError>> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(rsl_classifier::HttpError {
                        status: 401,
                        message: "denied".into(),
                        retry_after_ms: None,
                    })
                }
            },
            &config,
            &classifier,
            "test-op",
            None,
            &(),
            &listeners,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn max_attempts_one_never_retries_even_if_retryable() {
        let config = RetryConfig::builder().max_attempts(1).build().unwrap();
        let classifier = ErrorClassifier::new();
        let listeners = EventListeners::new();
        let calls = AtomicU32::new(0);

        let result: Result<((), u32), RetryError<OpaqueError>> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OpaqueError::new("timeout")) }
            },
            &config,
            &classifier,
            "test-op",
            None,
            &(),
            &listeners,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
