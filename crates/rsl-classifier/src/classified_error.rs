use crate::category::ErrorCategory;
use std::fmt;

/// The immutable verdict produced by [`crate::ErrorClassifier::classify`].
///
/// Always constructed through [`ClassifiedError::new`], which enforces the
/// one invariant that matters downstream: a non-retryable verdict never
/// carries a delay or a retry budget.
#[derive(Debug)]
pub struct ClassifiedError {
    category: ErrorCategory,
    is_retryable: bool,
    suggested_delay_ms: u64,
    explicit_delay_ms: Option<u64>,
    max_retries: u32,
    message: String,
    http_status: Option<u16>,
    provider_tag: Option<String>,
    origin: Box<dyn std::error::Error + Send + Sync>,
}

impl ClassifiedError {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        category: ErrorCategory,
        is_retryable: bool,
        suggested_delay_ms: u64,
        explicit_delay_ms: Option<u64>,
        max_retries: u32,
        message: impl Into<String>,
        http_status: Option<u16>,
        provider_tag: Option<String>,
        origin: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        let (suggested_delay_ms, explicit_delay_ms, max_retries) = if is_retryable {
            (suggested_delay_ms, explicit_delay_ms, max_retries)
        } else {
            (0, None, 0)
        };
        Self {
            category,
            is_retryable,
            suggested_delay_ms,
            explicit_delay_ms,
            max_retries,
            message: message.into(),
            http_status,
            provider_tag,
            origin,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }

    /// The delay a caller should show/report: an explicit signal if one was
    /// present, otherwise the category default. Retry backoff computation
    /// should consult [`Self::explicit_delay_ms`] instead, since this value
    /// does not distinguish the two.
    pub fn suggested_delay_ms(&self) -> u64 {
        self.suggested_delay_ms
    }

    /// `Some` only when the delay came from a genuine signal on the error
    /// itself (an HTTP `Retry-After` header, a message-embedded delay) —
    /// never from a category default. Backoff computation must only let this
    /// override the computed curve, or every category with a non-zero
    /// default (timeout, network, ...) would ignore backoff entirely.
    pub fn explicit_delay_ms(&self) -> Option<u64> {
        self.explicit_delay_ms
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn provider_tag(&self) -> Option<&str> {
        self.provider_tag.as_deref()
    }

    pub fn origin(&self) -> &(dyn std::error::Error + Send + Sync) {
        self.origin.as_ref()
    }

    pub fn into_origin(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.origin
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.origin.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_retryable_verdict_cannot_carry_delay_or_budget() {
        let err = ClassifiedError::new(
            ErrorCategory::AuthError,
            false,
            5000,
            Some(5000),
            3,
            "denied",
            Some(401),
            None,
            Box::new(std::io::Error::other("denied")),
        );
        assert!(!err.is_retryable());
        assert_eq!(err.suggested_delay_ms(), 0);
        assert_eq!(err.explicit_delay_ms(), None);
        assert_eq!(err.max_retries(), 0);
    }
}
