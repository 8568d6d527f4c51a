use crate::CircuitState;
use rsl_core::ResilienceEvent;
use std::time::Instant;

#[derive(Debug)]
pub enum CircuitEvent {
    StateChange {
        circuit_name: String,
        from: CircuitState,
        to: CircuitState,
        failures: u32,
        successes: u32,
        timestamp: Instant,
    },
    Reset {
        circuit_name: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for CircuitEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitEvent::StateChange { .. } => "circuit.state_change",
            CircuitEvent::Reset { .. } => "circuit.reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitEvent::StateChange { timestamp, .. } => *timestamp,
            CircuitEvent::Reset { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CircuitEvent::StateChange { circuit_name, .. } => circuit_name,
            CircuitEvent::Reset { circuit_name, .. } => circuit_name,
        }
    }
}
