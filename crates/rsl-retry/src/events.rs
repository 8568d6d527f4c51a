use rsl_classifier::ClassifiedError;
use rsl_core::ResilienceEvent;
use std::time::Instant;

/// Emitted before each backoff sleep. Never emitted for the final attempt.
#[derive(Debug)]
pub struct RetryEvent {
    pub operation_name: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub category: rsl_classifier::ErrorCategory,
    pub timestamp: Instant,
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        "retry.attempt"
    }

    fn timestamp(&self) -> Instant {
        self.timestamp
    }

    fn source(&self) -> &str {
        &self.operation_name
    }
}

impl RetryEvent {
    pub fn new(operation_name: &str, attempt: u32, max_attempts: u32, delay_ms: u64, classified: &ClassifiedError) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            attempt,
            max_attempts,
            delay_ms,
            category: classified.category(),
            timestamp: Instant::now(),
        }
    }
}
