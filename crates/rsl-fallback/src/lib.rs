//! Ordered alternatives tried after a primary operation fails, with an
//! optional degraded terminal value when every alternative also fails.

mod events;

pub use events::FallbackEvent;

use rsl_classifier::{ClassifiableError, ClassifyContext, ClassifiedError, ErrorClassifier};
use rsl_core::{Cancellation, EventListeners};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

type BoxedOp<T, E> = Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync>;
type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

pub struct Fallback<T, E> {
    pub name: String,
    pub priority: i32,
    operation: BoxedOp<T, E>,
    predicate: Option<Predicate<E>>,
}

impl<T, E> Fallback<T, E> {
    pub fn new<F, Fut>(name: impl Into<String>, priority: i32, operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            name: name.into(),
            priority,
            operation: Box::new(move || Box::pin(operation())),
            predicate: None,
        }
    }

    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

pub struct FallbackChain<T, E> {
    primary_name: String,
    fallbacks: Vec<Fallback<T, E>>,
    degraded: Option<Box<dyn Fn() -> T + Send + Sync>>,
}

impl<T, E> FallbackChain<T, E> {
    pub fn new(primary_name: impl Into<String>) -> Self {
        Self {
            primary_name: primary_name.into(),
            fallbacks: Vec::new(),
            degraded: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback<T, E>) -> Self {
        self.fallbacks.push(fallback);
        self.fallbacks.sort_by_key(|f| f.priority);
        self
    }

    pub fn with_degraded<F>(mut self, degraded: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.degraded = Some(Box::new(degraded));
        self
    }
}

#[derive(Debug, Error)]
pub enum FallbackError<E> {
    #[error("fallback chain cancelled")]
    Cancelled,
    /// The **primary** error, never the last fallback's, carrying the full
    /// accumulated list for observability.
    #[error("primary and all fallbacks failed: {primary}")]
    AllFailed {
        primary: E,
        errors: Vec<ClassifiedError>,
    },
}

pub struct FallbackOutcome<T> {
    pub success: bool,
    pub value: Option<T>,
    pub used_fallback: bool,
    pub fallback_name: Option<String>,
    pub is_degraded: bool,
    pub errors: Vec<ClassifiedError>,
}

enum Resolved<T, E> {
    Primary(T),
    Fallback { value: T, name: String },
    Degraded(T),
    Cancelled,
    AllFailed { primary: E, errors: Vec<ClassifiedError> },
}

/// Runs `primary`, then `chain.fallbacks` in ascending priority order on
/// failure, per the algorithm in the fallback chain contract. Shared by both
/// the throwing and non-throwing entry points so neither drops detail the
/// other reports.
async fn resolve<T, E, P, PFut>(
    primary: P,
    chain: &FallbackChain<T, E>,
    classifier: &ErrorClassifier,
    provider: Option<&str>,
    cancel: &dyn Cancellation,
    listeners: &EventListeners<FallbackEvent>,
) -> Resolved<T, E>
where
    E: ClassifiableError,
    P: FnOnce() -> PFut,
    PFut: Future<Output = Result<T, E>>,
{
    if cancel.is_cancelled() {
        return Resolved::Cancelled;
    }

    let primary_err = match primary().await {
        Ok(value) => {
            listeners.emit(&FallbackEvent::Success {
                from: chain.primary_name.clone(),
                timestamp: std::time::Instant::now(),
            });
            return Resolved::Primary(value);
        }
        Err(err) => err,
    };

    let ctx = provider.map(ClassifyContext::for_provider);
    let mut errors = vec![classifier.classify_dyn(&primary_err, ctx.as_ref())];

    #[cfg(feature = "tracing")]
    tracing::debug!(primary = %chain.primary_name, fallbacks = chain.fallbacks.len(), "primary failed, trying fallbacks");

    for fallback in &chain.fallbacks {
        if cancel.is_cancelled() {
            return Resolved::Cancelled;
        }
        if let Some(predicate) = &fallback.predicate {
            if !predicate(&primary_err) {
                continue;
            }
        }

        match (fallback.operation)().await {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                tracing::info!(from = %chain.primary_name, to = %fallback.name, "switched to fallback");
                #[cfg(feature = "metrics")]
                metrics::counter!("rsl_fallback_used_total", "from" => chain.primary_name.clone(), "to" => fallback.name.clone()).increment(1);

                listeners.emit(&FallbackEvent::Used {
                    from: chain.primary_name.clone(),
                    to: fallback.name.clone(),
                    timestamp: std::time::Instant::now(),
                });
                return Resolved::Fallback {
                    value,
                    name: fallback.name.clone(),
                };
            }
            Err(err) => {
                errors.push(classifier.classify_dyn(&err, ctx.as_ref()));
            }
        }
    }

    if let Some(degraded) = &chain.degraded {
        #[cfg(feature = "tracing")]
        tracing::info!(primary = %chain.primary_name, "all fallbacks exhausted, returning degraded value");
        #[cfg(feature = "metrics")]
        metrics::counter!("rsl_fallback_degraded_total", "primary" => chain.primary_name.clone()).increment(1);

        listeners.emit(&FallbackEvent::Degraded {
            from: chain.primary_name.clone(),
            reason: "primary and all fallbacks failed".to_string(),
            timestamp: std::time::Instant::now(),
        });
        return Resolved::Degraded(degraded());
    }

    Resolved::AllFailed {
        primary: primary_err,
        errors,
    }
}

/// Runs `primary`, then `chain.fallbacks` in ascending priority order on
/// failure, per the algorithm in the fallback chain contract.
pub async fn execute_fallback_chain<T, E, P, PFut>(
    primary: P,
    chain: &FallbackChain<T, E>,
    classifier: &ErrorClassifier,
    provider: Option<&str>,
    cancel: &dyn Cancellation,
    listeners: &EventListeners<FallbackEvent>,
) -> Result<T, FallbackError<E>>
where
    E: ClassifiableError,
    P: FnOnce() -> PFut,
    PFut: Future<Output = Result<T, E>>,
{
    match resolve(primary, chain, classifier, provider, cancel, listeners).await {
        Resolved::Primary(value) | Resolved::Fallback { value, .. } | Resolved::Degraded(value) => Ok(value),
        Resolved::Cancelled => Err(FallbackError::Cancelled),
        Resolved::AllFailed { primary, errors } => Err(FallbackError::AllFailed { primary, errors }),
    }
}

/// Non-throwing variant of [`execute_fallback_chain`].
pub async fn execute_fallback_chain_safe<T, E, P, PFut>(
    primary: P,
    chain: &FallbackChain<T, E>,
    classifier: &ErrorClassifier,
    provider: Option<&str>,
    cancel: &dyn Cancellation,
    listeners: &EventListeners<FallbackEvent>,
) -> FallbackOutcome<T>
where
    E: ClassifiableError,
    P: FnOnce() -> PFut,
    PFut: Future<Output = Result<T, E>>,
{
    match resolve(primary, chain, classifier, provider, cancel, listeners).await {
        Resolved::Primary(value) => FallbackOutcome {
            success: true,
            value: Some(value),
            used_fallback: false,
            fallback_name: None,
            is_degraded: false,
            errors: Vec::new(),
        },
        Resolved::Fallback { value, name } => FallbackOutcome {
            success: true,
            value: Some(value),
            used_fallback: true,
            fallback_name: Some(name),
            is_degraded: false,
            errors: Vec::new(),
        },
        Resolved::Degraded(value) => FallbackOutcome {
            success: true,
            value: Some(value),
            used_fallback: true,
            fallback_name: None,
            is_degraded: true,
            errors: Vec::new(),
        },
        Resolved::Cancelled => FallbackOutcome {
            success: false,
            value: None,
            used_fallback: false,
            fallback_name: None,
            is_degraded: false,
            errors: Vec::new(),
        },
        Resolved::AllFailed { errors, .. } => FallbackOutcome {
            success: false,
            value: None,
            used_fallback: false,
            fallback_name: None,
            is_degraded: false,
            errors,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsl_classifier::OpaqueError;

    #[tokio::test]
    async fn fallback_cascade_matches_the_literal_scenario() {
        let chain: FallbackChain<&str, OpaqueError> = FallbackChain::new("builder").with_fallback(
            Fallback::new("builder-simple", 0, || async { Ok("simple") }),
        );
        let classifier = ErrorClassifier::new();
        let listeners = EventListeners::new();

        let result = execute_fallback_chain(
            || async { Err(OpaqueError::new("builder failed")) },
            &chain,
            &classifier,
            None,
            &(),
            &listeners,
        )
        .await;

        assert_eq!(result.unwrap(), "simple");
    }

    #[tokio::test]
    async fn all_failed_re_raises_the_primary_error_not_the_last_fallback() {
        let chain: FallbackChain<&str, OpaqueError> = FallbackChain::new("primary")
            .with_fallback(Fallback::new("fb1", 0, || async {
                Err(OpaqueError::new("fb1 failed"))
            }));
        let classifier = ErrorClassifier::new();
        let listeners = EventListeners::new();

        let result = execute_fallback_chain(
            || async { Err(OpaqueError::new("primary failed")) },
            &chain,
            &classifier,
            None,
            &(),
            &listeners,
        )
        .await;

        match result {
            Err(FallbackError::AllFailed { primary, errors }) => {
                assert_eq!(primary.to_string(), "primary failed");
                assert_eq!(errors.len(), 2);
            }
            _ => panic!("expected AllFailed"),
        }
    }

    #[tokio::test]
    async fn degraded_value_is_returned_as_a_success_when_everything_fails() {
        let chain: FallbackChain<&str, OpaqueError> = FallbackChain::new("primary").with_degraded(|| "degraded-value");
        let classifier = ErrorClassifier::new();
        let listeners = EventListeners::new();

        let result = execute_fallback_chain(
            || async { Err(OpaqueError::new("primary failed")) },
            &chain,
            &classifier,
            None,
            &(),
            &listeners,
        )
        .await;

        assert_eq!(result.unwrap(), "degraded-value");
    }
}
