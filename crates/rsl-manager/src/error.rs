use rsl_circuit::CircuitOpenError;
use rsl_classifier::{ClassifiableError, ClassifiedError};
use rsl_timeout::TimeoutError;
use thiserror::Error;

/// Uniform failure type returned by [`crate::execute_with_resilience`],
/// regardless of which layer of the stack rejected the call. The real cause
/// is always reachable: a caller that only cares about the classified
/// category can call [`ResilienceError::classified`] without matching on the
/// variant.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),
    #[error(transparent)]
    TimedOut(#[from] TimeoutError),
    #[error(transparent)]
    Classified(#[from] rsl_retry::RetryFailure<E>),
}

impl<E> ResilienceError<E>
where
    E: std::fmt::Debug + std::fmt::Display,
{
    /// Best-effort classification for callers that don't want to match on
    /// the variant. Circuit-open and timeout don't carry a [`ClassifiedError`]
    /// of their own, so this synthesizes one consistent with how the
    /// classifier would have tagged the equivalent condition.
    pub fn classified(&self, classifier: &rsl_classifier::ErrorClassifier) -> ClassifiedError
    where
        E: ClassifiableError,
    {
        match self {
            ResilienceError::Cancelled => classifier.classify_dyn(&rsl_classifier::CancelledError, None),
            ResilienceError::CircuitOpen(err) => classifier.classify_message(&err.to_string(), None),
            ResilienceError::TimedOut(err) => classifier.classify_message(&err.to_string(), None),
            ResilienceError::Classified(failure) => classifier.classify_dyn(&failure.source, None),
        }
    }
}

impl<E> ClassifiableError for ResilienceError<E>
where
    E: ClassifiableError,
{
    fn http_status(&self) -> Option<u16> {
        match self {
            ResilienceError::Classified(failure) => failure.source.http_status(),
            _ => None,
        }
    }

    fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ResilienceError::Classified(failure) => failure.source.retry_after_ms(),
            _ => None,
        }
    }

    fn is_cancellation(&self) -> bool {
        matches!(self, ResilienceError::Cancelled | ResilienceError::TimedOut(_))
    }
}
