use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failure_threshold must be >= 1")]
    FailureThresholdTooLow,
    #[error("success_threshold must be >= 1")]
    SuccessThresholdTooLow,
    #[error("volume_threshold must be >= 1")]
    VolumeThresholdTooLow,
    #[error("half_open_max_calls must be >= 1")]
    HalfOpenMaxCallsTooLow,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_timeout_ms: u64,
    pub volume_threshold: u32,
    pub failure_window_ms: u64,
    pub half_open_max_calls: u32,
}

impl CircuitConfig {
    pub fn builder() -> CircuitConfigBuilder {
        CircuitConfigBuilder::default()
    }
}

pub struct CircuitConfigBuilder {
    failure_threshold: u32,
    success_threshold: u32,
    open_timeout_ms: u64,
    volume_threshold: u32,
    failure_window_ms: u64,
    half_open_max_calls: u32,
}

impl Default for CircuitConfigBuilder {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout_ms: 30_000,
            volume_threshold: 10,
            failure_window_ms: 60_000,
            half_open_max_calls: 1,
        }
    }
}

impl CircuitConfigBuilder {
    pub fn failure_threshold(mut self, value: u32) -> Self {
        self.failure_threshold = value;
        self
    }

    pub fn success_threshold(mut self, value: u32) -> Self {
        self.success_threshold = value;
        self
    }

    pub fn open_timeout_ms(mut self, value: u64) -> Self {
        self.open_timeout_ms = value;
        self
    }

    pub fn volume_threshold(mut self, value: u32) -> Self {
        self.volume_threshold = value;
        self
    }

    pub fn failure_window_ms(mut self, value: u64) -> Self {
        self.failure_window_ms = value;
        self
    }

    pub fn half_open_max_calls(mut self, value: u32) -> Self {
        self.half_open_max_calls = value;
        self
    }

    pub fn build(self) -> Result<CircuitConfig, ConfigError> {
        if self.failure_threshold < 1 {
            return Err(ConfigError::FailureThresholdTooLow);
        }
        if self.success_threshold < 1 {
            return Err(ConfigError::SuccessThresholdTooLow);
        }
        if self.volume_threshold < 1 {
            return Err(ConfigError::VolumeThresholdTooLow);
        }
        if self.half_open_max_calls < 1 {
            return Err(ConfigError::HalfOpenMaxCallsTooLow);
        }
        Ok(CircuitConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            open_timeout_ms: self.open_timeout_ms,
            volume_threshold: self.volume_threshold,
            failure_window_ms: self.failure_window_ms,
            half_open_max_calls: self.half_open_max_calls,
        })
    }
}
