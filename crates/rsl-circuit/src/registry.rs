use crate::circuit::{CircuitBreaker, CircuitMetrics, CircuitState};
use crate::config::CircuitConfig;
use crate::events::CircuitEvent;
use rsl_core::{BoxedEventListener, EventListener};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Named, lazy, exclusive ownership of breakers. The same name always
/// resolves to the same [`Arc<CircuitBreaker>`] for the registry's lifetime.
pub struct CircuitRegistry {
    default_config: CircuitConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
    fan_out: Mutex<Vec<BoxedEventListener<CircuitEvent>>>,
}

impl CircuitRegistry {
    pub fn new(default_config: CircuitConfig) -> Self {
        Self {
            default_config,
            breakers: Mutex::new(HashMap::new()),
            fan_out: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes a listener to every breaker's events, present and future.
    pub fn subscribe<L>(&self, listener: L)
    where
        L: EventListener<CircuitEvent> + 'static,
    {
        let boxed: BoxedEventListener<CircuitEvent> = Arc::new(listener);
        for breaker in self.breakers.lock().unwrap_or_else(|e| e.into_inner()).values() {
            breaker.listeners().add_boxed(boxed.clone());
        }
        self.fan_out.lock().unwrap_or_else(|e| e.into_inner()).push(boxed);
    }

    pub fn get_circuit(&self, name: &str, config_override: Option<CircuitConfig>) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = breakers.get(name) {
            return existing.clone();
        }
        let config = config_override.unwrap_or(self.default_config);
        let breaker = Arc::new(CircuitBreaker::new(name, config));
        for listener in self.fan_out.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            breaker.listeners().add_boxed(listener.clone());
        }
        breakers.insert(name.to_string(), breaker.clone());
        breaker
    }

    pub fn reset_circuit(&self, name: &str) {
        if let Some(breaker) = self.breakers.lock().unwrap_or_else(|e| e.into_inner()).get(name) {
            breaker.reset();
        }
    }

    pub fn reset_all(&self) {
        for breaker in self.breakers.lock().unwrap_or_else(|e| e.into_inner()).values() {
            breaker.reset();
        }
    }

    pub fn get_states(&self) -> HashMap<String, CircuitState> {
        self.breakers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.state()))
            .collect()
    }

    pub fn get_all_metrics(&self) -> HashMap<String, CircuitMetrics> {
        self.breakers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.metrics()))
            .collect()
    }

    /// Removes a breaker from the registry. Events already queued for
    /// delivery to its listeners are allowed to drain (delivery is
    /// synchronous, so by the time this returns nothing is still in flight
    /// on the caller's thread); the registry simply stops handing out the
    /// removed name.
    pub fn remove(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.lock().unwrap_or_else(|e| e.into_inner()).remove(name)
    }

    pub fn size(&self) -> usize {
        self.breakers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn get_names(&self) -> Vec<String> {
        self.breakers.lock().unwrap_or_else(|e| e.into_inner()).keys().cloned().collect()
    }
}

/// Stable naming conventions for circuit keys.
pub fn provider_key(id: &str) -> String {
    format!("provider:{id}")
}

pub fn agent_key(id: &str) -> String {
    format!("agent:{id}")
}
