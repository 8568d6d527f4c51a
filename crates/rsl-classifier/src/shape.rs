use std::error::Error as StdError;

/// A capability probe for the handful of shapes the classifier cares about.
///
/// Concrete error types opt in by overriding the provided methods; anything
/// that doesn't know about HTTP status codes or `Retry-After` headers just
/// uses the defaults and falls through to message-pattern matching. This is
/// the "is-http-statused" / "has-headers" protocol in lieu of runtime
/// type probing: behavior, not identity, decides classification.
pub trait ClassifiableError: StdError + Send + Sync + 'static {
    /// HTTP status code, if this failure originated from an HTTP response.
    /// Default walks [`StdError::source`] looking for a source that itself
    /// implements `ClassifiableError` with a status.
    fn http_status(&self) -> Option<u16> {
        self.source()
            .and_then(|s| s.downcast_ref::<DynClassifiable>())
            .and_then(|s| s.0.http_status())
    }

    /// Milliseconds to wait before retrying, taken from a `Retry-After`
    /// header (seconds, HTTP-date, or raw milliseconds — already resolved by
    /// the caller, since Rust has no single canonical HTTP response type to
    /// parse it from here).
    fn retry_after_ms(&self) -> Option<u64> {
        None
    }

    /// True if this error represents external cancellation rather than a
    /// domain failure.
    fn is_cancellation(&self) -> bool {
        false
    }
}

/// Wraps a boxed error so [`ClassifiableError::http_status`]'s default
/// `source()` walk can downcast into it.
struct DynClassifiable(Box<dyn ClassifiableError>);

impl std::fmt::Debug for DynClassifiable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for DynClassifiable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for DynClassifiable {}

/// A plain error with no extra shape — the common case for wrapped provider
/// SDK failures that only carry a message.
#[derive(Debug)]
pub struct OpaqueError(String);

impl OpaqueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for OpaqueError {}
impl ClassifiableError for OpaqueError {}

/// An error carrying an explicit HTTP status, used by callers that already
/// parsed a response (e.g. a provider SDK failure).
#[derive(Debug)]
pub struct HttpError {
    pub status: u16,
    pub message: String,
    pub retry_after_ms: Option<u64>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl StdError for HttpError {}

impl ClassifiableError for HttpError {
    fn http_status(&self) -> Option<u16> {
        Some(self.status)
    }

    fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after_ms
    }
}

/// A cooperative-cancellation signal surfaced as an error.
#[derive(Debug)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl StdError for CancelledError {}

impl ClassifiableError for CancelledError {
    fn is_cancellation(&self) -> bool {
        true
    }
}
