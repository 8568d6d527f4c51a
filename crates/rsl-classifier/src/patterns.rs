use crate::category::ErrorCategory;
use regex::RegexBuilder;
use std::sync::LazyLock;

/// One row of the message-pattern table: a compiled, case-insensitive regex,
/// the category it maps to, and an optional provider scope ("claude" for the
/// "overloaded" pattern, which is a provider-specific phrase rather than a
/// generic one).
pub struct MessagePattern {
    pub regex: regex::Regex,
    pub category: ErrorCategory,
    pub provider_scope: Option<&'static str>,
}

fn ci(pattern: &str) -> regex::Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid classifier pattern {pattern:?}: {e}"))
}

/// Ordered message-pattern table. First match wins; callers skip entries
/// whose `provider_scope` doesn't match the calling context's provider.
pub static MESSAGE_PATTERNS: LazyLock<Vec<MessagePattern>> = LazyLock::new(|| {
    use ErrorCategory::*;
    vec![
        MessagePattern {
            regex: ci(r"rate.?limit"),
            category: RateLimit,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"too many requests"),
            category: RateLimit,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"quota exceeded"),
            category: RateLimit,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"overloaded"),
            category: RateLimit,
            provider_scope: Some("claude"),
        },
        MessagePattern {
            regex: ci(r"timed? ?out"),
            category: Timeout,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"timeout"),
            category: Timeout,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"deadline exceeded"),
            category: Timeout,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"etimedout"),
            category: Timeout,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"network"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"econn(reset|refused)"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"enotfound"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"socket hang up"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"connection refused"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"fetch failed"),
            category: Network,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"unauthorized"),
            category: AuthError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"authentication"),
            category: AuthError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"invalid.*api.?key"),
            category: AuthError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"permission denied"),
            category: AuthError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"context.*(length|window|limit)"),
            category: ContextOverflow,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"max.?tokens"),
            category: ContextOverflow,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"token limit"),
            category: ContextOverflow,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"too long"),
            category: ContextOverflow,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"tool.*(failed|error)"),
            category: ToolError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"execution failed"),
            category: ToolError,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"process.*(died|crashed|killed)"),
            category: AgentCrash,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"sigterm|sigkill"),
            category: AgentCrash,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"validation.*(failed|error)"),
            category: ValidationFailed,
            provider_scope: None,
        },
        MessagePattern {
            regex: ci(r"invalid.*(input|request|parameter)"),
            category: ValidationFailed,
            provider_scope: None,
        },
    ]
});

/// HTTP status code to category mapping, first match wins.
pub fn category_for_http_status(status: u16) -> Option<ErrorCategory> {
    use ErrorCategory::*;
    match status {
        400 => Some(InvalidRequest),
        401 | 403 => Some(AuthError),
        404 => Some(NotFound),
        408 | 504 => Some(Timeout),
        429 => Some(RateLimit),
        500 | 502 | 503 => Some(ServiceUnavailable),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile_and_match_expected_categories() {
        let table = &*MESSAGE_PATTERNS;
        let hit = |text: &str| {
            table
                .iter()
                .find(|p| p.provider_scope.is_none() && p.regex.is_match(text))
                .map(|p| p.category)
        };
        assert_eq!(hit("Rate limit exceeded"), Some(ErrorCategory::RateLimit));
        assert_eq!(hit("Request timed out"), Some(ErrorCategory::Timeout));
        assert_eq!(hit("ECONNRESET"), Some(ErrorCategory::Network));
        assert_eq!(hit("Unauthorized access"), Some(ErrorCategory::AuthError));
        assert_eq!(
            hit("context window exceeded"),
            Some(ErrorCategory::ContextOverflow)
        );
    }

    #[test]
    fn provider_scoped_pattern_is_excluded_from_generic_scan() {
        let table = &*MESSAGE_PATTERNS;
        let generic_hit = table
            .iter()
            .find(|p| p.provider_scope.is_none() && p.regex.is_match("model overloaded"));
        assert!(generic_hit.is_none());
    }
}
