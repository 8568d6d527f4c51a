use std::fmt;

/// The stable taxonomy downstream decisions key off. Never add a variant
/// without also adding its row to [`CategoryDefaults`](crate::defaults::CategoryDefaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    RateLimit,
    Timeout,
    Network,
    ServiceUnavailable,
    AuthError,
    InvalidRequest,
    NotFound,
    ContextOverflow,
    ToolError,
    AgentCrash,
    ValidationFailed,
    Unknown,
}

impl ErrorCategory {
    /// Transient categories are worth retrying on their own terms; permanent
    /// categories never are, regardless of the default table (the table is
    /// the source of truth, this is just a sanity cross-check used in tests).
    pub fn is_transient(self) -> bool {
        !matches!(
            self,
            ErrorCategory::AuthError
                | ErrorCategory::InvalidRequest
                | ErrorCategory::NotFound
                | ErrorCategory::ContextOverflow
                | ErrorCategory::ValidationFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::ServiceUnavailable => "service_unavailable",
            ErrorCategory::AuthError => "auth_error",
            ErrorCategory::InvalidRequest => "invalid_request",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::ContextOverflow => "context_overflow",
            ErrorCategory::ToolError => "tool_error",
            ErrorCategory::AgentCrash => "agent_crash",
            ErrorCategory::ValidationFailed => "validation_failed",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
