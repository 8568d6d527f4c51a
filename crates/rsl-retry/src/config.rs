use rsl_classifier::ClassifiedError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_attempts must be >= 1")]
    MaxAttemptsTooLow,
    #[error("max_delay_ms ({max_delay_ms}) must be >= initial_delay_ms ({initial_delay_ms})")]
    MaxDelayBelowInitial {
        max_delay_ms: u64,
        initial_delay_ms: u64,
    },
    #[error("backoff_multiplier must be >= 1.0")]
    MultiplierTooLow,
    #[error("jitter_factor must be in [0, 1]")]
    JitterOutOfRange,
}

type ShouldRetry = Arc<dyn Fn(&ClassifiedError) -> Option<bool> + Send + Sync>;

/// Configuration for [`crate::with_retry`]. Construct via [`RetryConfigBuilder`].
#[derive(Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
    pub attempt_timeout_ms: Option<u64>,
    /// Overrides the classifier's retryability verdict: `Some(true/false)`
    /// to force a decision, `None` to defer to the classifier.
    should_retry: Option<ShouldRetry>,
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    pub fn should_retry_override(&self, classified: &ClassifiedError) -> Option<bool> {
        self.should_retry.as_ref().and_then(|f| f(classified))
    }
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay_ms", &self.initial_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter_factor", &self.jitter_factor)
            .field("attempt_timeout_ms", &self.attempt_timeout_ms)
            .field("should_retry", &self.should_retry.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

pub struct RetryConfigBuilder {
    max_attempts: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
    attempt_timeout_ms: Option<u64>,
    should_retry: Option<ShouldRetry>,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            attempt_timeout_ms: None,
            should_retry: None,
        }
    }
}

impl RetryConfigBuilder {
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.max_attempts = value;
        self
    }

    pub fn initial_delay_ms(mut self, value: u64) -> Self {
        self.initial_delay_ms = value;
        self
    }

    pub fn max_delay_ms(mut self, value: u64) -> Self {
        self.max_delay_ms = value;
        self
    }

    pub fn backoff_multiplier(mut self, value: f64) -> Self {
        self.backoff_multiplier = value;
        self
    }

    pub fn jitter_factor(mut self, value: f64) -> Self {
        self.jitter_factor = value;
        self
    }

    pub fn attempt_timeout_ms(mut self, value: u64) -> Self {
        self.attempt_timeout_ms = Some(value);
        self
    }

    pub fn should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClassifiedError) -> Option<bool> + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        if self.max_attempts < 1 {
            return Err(ConfigError::MaxAttemptsTooLow);
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::MaxDelayBelowInitial {
                max_delay_ms: self.max_delay_ms,
                initial_delay_ms: self.initial_delay_ms,
            });
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ConfigError::MultiplierTooLow);
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::JitterOutOfRange);
        }
        Ok(RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            backoff_multiplier: self.backoff_multiplier,
            jitter_factor: self.jitter_factor,
            attempt_timeout_ms: self.attempt_timeout_ms,
            should_retry: self.should_retry,
        })
    }
}
