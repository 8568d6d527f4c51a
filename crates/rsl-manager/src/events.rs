use rsl_circuit::CircuitState;
use rsl_classifier::ErrorCategory;
use rsl_core::ResilienceEvent;
use std::time::Instant;

/// One merged stream carrying every sub-component's events, so a caller that
/// only wants to watch "what is this call doing to stay alive" subscribes
/// once instead of wiring up retry, circuit and fallback listeners
/// separately.
#[derive(Debug)]
pub enum RecoveryEvent {
    Retry {
        operation_name: String,
        attempt: u32,
        delay_ms: u64,
        category: ErrorCategory,
        timestamp: Instant,
    },
    CircuitStateChange {
        circuit: String,
        from: CircuitState,
        to: CircuitState,
        timestamp: Instant,
    },
    Fallback {
        from: String,
        to: String,
        timestamp: Instant,
    },
    Degraded {
        reason: String,
        timestamp: Instant,
    },
    Recovered {
        operation_name: String,
        after_ms: u64,
        attempts: u32,
        timestamp: Instant,
    },
    Failed {
        operation_name: String,
        category: ErrorCategory,
        message: String,
        exhausted: bool,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RecoveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RecoveryEvent::Retry { .. } => "recovery.retry",
            RecoveryEvent::CircuitStateChange { .. } => "recovery.circuit_state_change",
            RecoveryEvent::Fallback { .. } => "recovery.fallback",
            RecoveryEvent::Degraded { .. } => "recovery.degraded",
            RecoveryEvent::Recovered { .. } => "recovery.recovered",
            RecoveryEvent::Failed { .. } => "recovery.failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RecoveryEvent::Retry { timestamp, .. }
            | RecoveryEvent::CircuitStateChange { timestamp, .. }
            | RecoveryEvent::Fallback { timestamp, .. }
            | RecoveryEvent::Degraded { timestamp, .. }
            | RecoveryEvent::Recovered { timestamp, .. }
            | RecoveryEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            RecoveryEvent::Retry { operation_name, .. } => operation_name,
            RecoveryEvent::CircuitStateChange { circuit, .. } => circuit,
            RecoveryEvent::Fallback { from, .. } => from,
            RecoveryEvent::Degraded { reason, .. } => reason,
            RecoveryEvent::Recovered { operation_name, .. } => operation_name,
            RecoveryEvent::Failed { operation_name, .. } => operation_name,
        }
    }
}
