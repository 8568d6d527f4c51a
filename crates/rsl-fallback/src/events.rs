use rsl_core::ResilienceEvent;
use std::time::Instant;

#[derive(Debug)]
pub enum FallbackEvent {
    Success {
        from: String,
        timestamp: Instant,
    },
    Used {
        from: String,
        to: String,
        timestamp: Instant,
    },
    Degraded {
        from: String,
        reason: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::Success { .. } => "fallback.success",
            FallbackEvent::Used { .. } => "fallback.used",
            FallbackEvent::Degraded { .. } => "fallback.degraded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::Success { timestamp, .. }
            | FallbackEvent::Used { timestamp, .. }
            | FallbackEvent::Degraded { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            FallbackEvent::Success { from, .. }
            | FallbackEvent::Used { from, .. }
            | FallbackEvent::Degraded { from, .. } => from,
        }
    }
}
