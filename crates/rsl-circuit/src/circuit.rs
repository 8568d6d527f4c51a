use crate::config::CircuitConfig;
use crate::events::CircuitEvent;
use rsl_core::EventListeners;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

impl CircuitState {
    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    fn tag(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Error)]
#[error("circuit {circuit_name} is open")]
pub struct CircuitOpenError {
    pub circuit_name: String,
}

#[derive(Debug, Error)]
pub enum CircuitError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpenError),
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    pub total_calls: u64,
    pub failure_rate: f64,
    pub last_state_change: Instant,
}

struct Inner {
    failures: u32,
    successes: u32,
    total_calls: u64,
    opened_at: Option<Instant>,
    last_state_change: Instant,
    half_open_in_flight: u32,
    call_history: VecDeque<(Instant, bool)>,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Self {
            failures: 0,
            successes: 0,
            total_calls: 0,
            opened_at: None,
            last_state_change: Instant::now(),
            half_open_in_flight: 0,
            call_history: VecDeque::new(),
            last_failure: None,
            last_success: None,
        }
    }
}

/// Per-key state machine gating call admission based on recent failure rate.
/// All mutation happens under one lock so an admission decision is never
/// made against state a concurrent caller is mid-write on.
pub struct CircuitBreaker {
    name: String,
    config: CircuitConfig,
    state: AtomicU8,
    inner: Mutex<Inner>,
    listeners: Mutex<EventListeners<CircuitEvent>>,
}

enum Admission {
    Denied,
    Granted { half_open: bool },
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: AtomicU8::new(CircuitState::Closed.tag()),
            inner: Mutex::new(Inner::new()),
            listeners: Mutex::new(EventListeners::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn listeners(&self) -> std::sync::MutexGuard<'_, EventListeners<CircuitEvent>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock-free snapshot; does not itself perform the open->half-open
    /// transition (that only happens under the lock, during admission).
    pub fn state(&self) -> CircuitState {
        CircuitState::from_tag(self.state.load(Ordering::Acquire))
    }

    pub fn can_execute(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        !matches!(self.admit(&mut inner), Admission::Denied)
    }

    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let half_open = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match self.admit(&mut inner) {
                Admission::Denied => {
                    return Err(CircuitOpenError {
                        circuit_name: self.name.clone(),
                    }
                    .into())
                }
                Admission::Granted { half_open } => half_open,
            }
        };

        let result = op().await;

        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if half_open {
                inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
            }
            match &result {
                Ok(_) => self.record_success_locked(&mut inner),
                Err(_) => self.record_failure_locked(&mut inner),
            }
        }

        result.map_err(CircuitError::Inner)
    }

    /// Re-evaluates the open->half-open transition and the admission rule,
    /// incrementing the half-open in-flight counter in the same critical
    /// section as the decision (resolving the spec's half-open-counter Open
    /// Question).
    fn admit(&self, inner: &mut Inner) -> Admission {
        match self.state() {
            CircuitState::Closed => Admission::Granted { half_open: false },
            CircuitState::Open => {
                let elapsed_ok = inner
                    .opened_at
                    .is_some_and(|opened_at| opened_at.elapsed() >= Duration::from_millis(self.config.open_timeout_ms));
                if elapsed_ok {
                    self.transition(inner, CircuitState::HalfOpen);
                    inner.successes = 0;
                    inner.half_open_in_flight = 0;
                    self.admit_half_open(inner)
                } else {
                    Admission::Denied
                }
            }
            CircuitState::HalfOpen => self.admit_half_open(inner),
        }
    }

    fn admit_half_open(&self, inner: &mut Inner) -> Admission {
        if inner.half_open_in_flight < self.config.half_open_max_calls {
            inner.half_open_in_flight += 1;
            Admission::Granted { half_open: true }
        } else {
            Admission::Denied
        }
    }

    fn record_success_locked(&self, inner: &mut Inner) {
        let now = Instant::now();
        inner.total_calls += 1;
        inner.last_success = Some(now);
        self.push_history(inner, now, true);

        match self.state() {
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.opened_at = None;
                    self.transition(inner, CircuitState::Closed);
                }
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }

    fn record_failure_locked(&self, inner: &mut Inner) {
        let now = Instant::now();
        inner.total_calls += 1;
        inner.last_failure = Some(now);
        self.push_history(inner, now, false);

        match self.state() {
            CircuitState::HalfOpen => {
                inner.opened_at = Some(now);
                self.transition(inner, CircuitState::Open);
            }
            CircuitState::Closed => {
                inner.failures = self.failures_in_window(inner, now);
                if inner.total_calls >= self.config.volume_threshold as u64
                    && inner.failures >= self.config.failure_threshold
                {
                    inner.opened_at = Some(now);
                    self.transition(inner, CircuitState::Open);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn push_history(&self, inner: &mut Inner, now: Instant, ok: bool) {
        inner.call_history.push_back((now, ok));
        let window = Duration::from_millis(self.config.failure_window_ms);
        while let Some((ts, _)) = inner.call_history.front() {
            if now.duration_since(*ts) > window {
                inner.call_history.pop_front();
            } else {
                break;
            }
        }
    }

    fn failures_in_window(&self, inner: &Inner, now: Instant) -> u32 {
        let window = Duration::from_millis(self.config.failure_window_ms);
        inner
            .call_history
            .iter()
            .filter(|(ts, ok)| !ok && now.duration_since(*ts) <= window)
            .count() as u32
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = self.state();
        if from == to {
            return;
        }
        self.state.store(to.tag(), Ordering::Release);
        inner.last_state_change = Instant::now();

        #[cfg(feature = "tracing")]
        tracing::info!(circuit = %self.name, from = %from, to = %to, failures = inner.failures, "circuit breaker transitioned");
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("rsl_circuit_transitions_total", "circuit" => self.name.clone(), "to" => to.to_string()).increment(1);
            if to == CircuitState::Open {
                metrics::counter!("rsl_circuit_opens_total", "circuit" => self.name.clone()).increment(1);
            }
        }

        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).emit(&CircuitEvent::StateChange {
            circuit_name: self.name.clone(),
            from,
            to,
            failures: inner.failures,
            successes: inner.successes,
            timestamp: inner.last_state_change,
        });
    }

    pub fn force_state(&self, to: CircuitState) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        self.transition(&mut inner, to);
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *inner = Inner::new();
        self.state.store(CircuitState::Closed.tag(), Ordering::Release);
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).emit(&CircuitEvent::Reset {
            circuit_name: self.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn metrics(&self) -> CircuitMetrics {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let failure_rate = if inner.call_history.is_empty() {
            0.0
        } else {
            let failures = inner.call_history.iter().filter(|(_, ok)| !ok).count();
            failures as f64 / inner.call_history.len() as f64
        };
        CircuitMetrics {
            state: self.state(),
            failures: inner.failures,
            successes: inner.successes,
            total_calls: inner.total_calls,
            failure_rate,
            last_state_change: inner.last_state_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn config(failure_threshold: u32, volume_threshold: u32, open_timeout_ms: u64, success_threshold: u32) -> CircuitConfig {
        CircuitConfig::builder()
            .failure_threshold(failure_threshold)
            .volume_threshold(volume_threshold)
            .open_timeout_ms(open_timeout_ms)
            .success_threshold(success_threshold)
            .half_open_max_calls(1)
            .build()
            .unwrap()
    }

    async fn fail(breaker: &CircuitBreaker) {
        let _ = breaker.execute::<(), &str, _, _>(|| async { Err("boom") }).await;
    }

    async fn succeed(breaker: &CircuitBreaker) {
        let _ = breaker
            .execute::<(), Infallible, _, _>(|| async { Ok(()) })
            .await;
    }

    #[tokio::test]
    async fn opens_then_half_opens_then_closes_per_the_literal_scenario() {
        let breaker = CircuitBreaker::new("svc", config(2, 1, 50, 1));

        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(!breaker.can_execute());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        succeed(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_with_max_calls_one_admits_a_single_probe() {
        let breaker = std::sync::Arc::new(CircuitBreaker::new("svc", config(1, 1, 0, 1)));
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let rx = std::sync::Arc::new(tokio::sync::Mutex::new(Some(rx)));
        let b2 = breaker.clone();
        let rx2 = rx.clone();
        let probe = tokio::spawn(async move {
            b2.execute::<(), &str, _, _>(|| async move {
                let rx = rx2.lock().await.take().unwrap();
                let _ = rx.await;
                Ok(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!breaker.can_execute(), "second probe must be denied while one is in flight");

        let _ = tx.send(());
        let _ = probe.await;
    }

    #[tokio::test]
    async fn does_not_open_below_volume_threshold() {
        let breaker = CircuitBreaker::new("svc", config(1, 5, 30_000, 1));
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
