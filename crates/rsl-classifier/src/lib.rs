//! Maps arbitrary failures — LLM provider errors, tool execution failures,
//! subagent crashes, network I/O — into a stable retry taxonomy.
//!
//! [`ErrorClassifier::classify`] never panics: inputs are normalized
//! defensively and anything that matches nothing falls through to
//! [`ErrorCategory::Unknown`].

mod category;
mod classified_error;
mod defaults;
mod patterns;
mod shape;

pub use category::ErrorCategory;
pub use classified_error::ClassifiedError;
pub use shape::{CancelledError, ClassifiableError, HttpError, OpaqueError};

/// Extra information the caller already knows about the failing call that
/// the error value itself cannot carry (which provider made the call).
#[derive(Debug, Clone, Default)]
pub struct ClassifyContext {
    pub provider: Option<String>,
}

impl ClassifyContext {
    pub fn for_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
        }
    }
}

/// Stateless (beyond its compiled pattern table) classifier. Construct once
/// and share; `classify` takes `&self` only because the signature mirrors
/// other component entry points, not because it needs exclusive access.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn is_retryable(&self, error: &dyn ClassifiableError, ctx: Option<&ClassifyContext>) -> bool {
        self.classify_dyn(error, ctx).is_retryable()
    }

    /// Classifies any error that has opted into the [`ClassifiableError`]
    /// capability probe. Most call sites should prefer this over
    /// [`Self::classify_message`], since it gets HTTP status and
    /// cancellation detection for free.
    pub fn classify_dyn(
        &self,
        error: &dyn ClassifiableError,
        ctx: Option<&ClassifyContext>,
    ) -> ClassifiedError {
        let message = error.to_string();
        self.classify_parts(
            &message,
            error.http_status(),
            error.retry_after_ms(),
            error.is_cancellation(),
            ctx,
            Box::new(OpaqueError::new(message.clone())),
        )
    }

    /// Classifies a bare message with no structured error value at all
    /// (e.g. stderr captured from a subprocess). Skips the HTTP-status step
    /// since there is no status to extract.
    pub fn classify_message(&self, message: &str, ctx: Option<&ClassifyContext>) -> ClassifiedError {
        self.classify_parts(
            message,
            None,
            None,
            false,
            ctx,
            Box::new(OpaqueError::new(message.to_string())),
        )
    }

    fn classify_parts(
        &self,
        message: &str,
        http_status: Option<u16>,
        retry_after_ms: Option<u64>,
        is_cancellation: bool,
        ctx: Option<&ClassifyContext>,
        origin: Box<dyn std::error::Error + Send + Sync>,
    ) -> ClassifiedError {
        let provider = ctx.and_then(|c| c.provider.as_deref());

        // 1. HTTP status, walking the cause chain is the caller's job via
        //    ClassifiableError::http_status's default `source()` walk.
        if let Some(status) = http_status {
            if let Some(category) = patterns::category_for_http_status(status) {
                return self.finish(category, message, http_status, provider, retry_after_ms, origin);
            }
        }

        // 2. Cancellation short-circuits to timeout per the error-type
        //    heuristic, ahead of message matching.
        if is_cancellation {
            return self.finish(
                crate::ErrorCategory::Timeout,
                message,
                http_status,
                provider,
                retry_after_ms,
                origin,
            );
        }

        // 3. Message pattern table, first match wins, honoring provider scope.
        for pattern in patterns::MESSAGE_PATTERNS.iter() {
            if let Some(scope) = pattern.provider_scope {
                if provider != Some(scope) {
                    continue;
                }
            }
            if pattern.regex.is_match(message) {
                return self.finish(
                    pattern.category,
                    message,
                    http_status,
                    provider,
                    retry_after_ms,
                    origin,
                );
            }
        }

        // 4. TypeError-ish heuristic: a message mentioning "fetch" with no
        //    other signal is treated as a network failure.
        if message.to_lowercase().contains("fetch") {
            return self.finish(
                crate::ErrorCategory::Network,
                message,
                http_status,
                provider,
                retry_after_ms,
                origin,
            );
        }

        self.finish(
            crate::ErrorCategory::Unknown,
            message,
            http_status,
            provider,
            retry_after_ms,
            origin,
        )
    }

    fn finish(
        &self,
        category: ErrorCategory,
        message: &str,
        http_status: Option<u16>,
        provider: Option<&str>,
        retry_after_ms: Option<u64>,
        origin: Box<dyn std::error::Error + Send + Sync>,
    ) -> ClassifiedError {
        let default = defaults::default_for(category);
        // retry_after_ms is a real signal off the error itself (an HTTP
        // Retry-After header today); it must never be confused with a
        // category default downstream, or backoff computation would treat
        // every Timeout/Network/... verdict as if it carried an explicit
        // delay.
        let suggested_delay_ms = if category == ErrorCategory::RateLimit {
            retry_after_ms.unwrap_or(default.suggested_delay_ms)
        } else {
            default.suggested_delay_ms
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            category = %category,
            is_retryable = default.is_retryable,
            provider,
            "classified failure"
        );

        ClassifiedError::new(
            category,
            default.is_retryable,
            suggested_delay_ms,
            retry_after_ms,
            default.max_retries,
            message,
            http_status,
            provider.map(str::to_string),
            origin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_401_as_auth_error_not_retryable() {
        let classifier = ErrorClassifier::new();
        let err = HttpError {
            status: 401,
            message: "no token".into(),
            retry_after_ms: None,
        };
        let classified = classifier.classify_dyn(&err, None);
        assert_eq!(classified.category(), ErrorCategory::AuthError);
        assert!(!classified.is_retryable());
    }

    #[test]
    fn retry_after_overrides_the_rate_limit_default_delay() {
        let classifier = ErrorClassifier::new();
        let err = HttpError {
            status: 429,
            message: "slow down".into(),
            retry_after_ms: Some(0),
        };
        let classified = classifier.classify_dyn(&err, None);
        assert_eq!(classified.category(), ErrorCategory::RateLimit);
        assert_eq!(classified.suggested_delay_ms(), 0);
    }

    #[test]
    fn claude_overloaded_requires_provider_scope() {
        let classifier = ErrorClassifier::new();
        let unscoped = classifier.classify_message("model overloaded", None);
        assert_eq!(unscoped.category(), ErrorCategory::Unknown);

        let scoped = classifier.classify_message(
            "model overloaded",
            Some(&ClassifyContext::for_provider("claude")),
        );
        assert_eq!(scoped.category(), ErrorCategory::RateLimit);
    }

    #[test]
    fn cancellation_classifies_as_timeout() {
        let classifier = ErrorClassifier::new();
        let classified = classifier.classify_dyn(&CancelledError, None);
        assert_eq!(classified.category(), ErrorCategory::Timeout);
    }

    #[test]
    fn unmatched_message_falls_back_to_unknown_with_one_retry() {
        let classifier = ErrorClassifier::new();
        let classified = classifier.classify_message("something bizarre happened", None);
        assert_eq!(classified.category(), ErrorCategory::Unknown);
        assert!(classified.is_retryable());
        assert_eq!(classified.max_retries(), 1);
    }
}
