//! Single entry point composing retry, circuit breaking, timeout supervision
//! and fallback chains around one fallible operation, and a merged event
//! stream so a caller subscribes once instead of wiring up each component.

mod config;
mod error;
mod events;
mod metrics;

pub use config::ResilienceOptions;
pub use error::ResilienceError;
pub use events::RecoveryEvent;
pub use metrics::ResilienceMetrics;

use metrics::ManagerMetrics;
use rsl_circuit::{CircuitConfig, CircuitError, CircuitEvent, CircuitRegistry, CircuitState};
use rsl_classifier::{ClassifiableError, ClassifiedError, ErrorClassifier};
use rsl_core::{Cancellation, EventListener, EventListeners, FnListener};
use rsl_fallback::{execute_fallback_chain, FallbackError, FallbackEvent};
use rsl_retry::{with_retry, RetryConfig, RetryError, RetryEvent};
use rsl_timeout::{with_timeout, OperationType, TimeoutError, TimeoutOptions, DEFAULT_TIMEOUT_MS};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

struct TokenCancellation<'a>(Option<&'a CancellationToken>);

impl Cancellation for TokenCancellation<'_> {
    fn is_cancelled(&self) -> bool {
        self.0.is_some_and(CancellationToken::is_cancelled)
    }
}

/// Shared sink every sub-component's events get forwarded into, handed out
/// as an `Arc` to the circuit registry's fan-out so it keeps receiving
/// events from circuits created after subscription.
pub(crate) struct RecoverySink {
    listeners: Mutex<EventListeners<RecoveryEvent>>,
}

impl RecoverySink {
    fn new() -> Self {
        Self {
            listeners: Mutex::new(EventListeners::new()),
        }
    }

    fn emit(&self, event: RecoveryEvent) {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).emit(&event);
    }

    fn subscribe<L>(&self, listener: L)
    where
        L: EventListener<RecoveryEvent> + 'static,
    {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).add(listener);
    }
}

/// Forwards circuit state changes from the registry's fan-out onto a
/// [`RecoverySink`], and counts transitions into `Open` on the way through.
struct CircuitBridge {
    recovery: Arc<RecoverySink>,
    metrics: Arc<ManagerMetrics>,
}

impl EventListener<CircuitEvent> for CircuitBridge {
    fn on_event(&self, event: &CircuitEvent) {
        if let CircuitEvent::StateChange { circuit_name, from, to, .. } = event {
            if *to == CircuitState::Open {
                self.metrics.record_circuit_open();
            }
            self.recovery.emit(RecoveryEvent::CircuitStateChange {
                circuit: circuit_name.clone(),
                from: *from,
                to: *to,
                timestamp: Instant::now(),
            });
        }
    }
}

/// Facade over [`rsl_retry`], [`rsl_circuit`], [`rsl_timeout`] and
/// [`rsl_fallback`]. Holds the circuit registry and default configs so
/// callers don't thread them through every call site.
pub struct ResilienceManager {
    classifier: ErrorClassifier,
    circuits: CircuitRegistry,
    default_retry: RetryConfig,
    default_timeout_ms: u64,
    enabled: AtomicBool,
    metrics: Arc<ManagerMetrics>,
    recovery: Arc<RecoverySink>,
}

impl ResilienceManager {
    pub fn new(default_retry: RetryConfig, default_circuit: CircuitConfig) -> Self {
        let recovery = Arc::new(RecoverySink::new());
        let metrics = Arc::new(ManagerMetrics::new());
        let circuits = CircuitRegistry::new(default_circuit);
        circuits.subscribe(CircuitBridge {
            recovery: recovery.clone(),
            metrics: metrics.clone(),
        });
        Self {
            classifier: ErrorClassifier::new(),
            circuits,
            default_retry,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            enabled: AtomicBool::new(true),
            metrics,
            recovery,
        }
    }

    pub fn subscribe<L>(&self, listener: L)
    where
        L: EventListener<RecoveryEvent> + 'static,
    {
        self.recovery.subscribe(listener);
    }

    pub fn classify_error(&self, error: &dyn ClassifiableError) -> ClassifiedError {
        self.classifier.classify_dyn(error, None)
    }

    pub fn is_retryable(&self, error: &dyn ClassifiableError) -> bool {
        self.classifier.is_retryable(error, None)
    }

    pub fn get_circuit(&self, name: &str) -> Arc<rsl_circuit::CircuitBreaker> {
        self.circuits.get_circuit(name, None)
    }

    pub fn get_circuit_states(&self) -> HashMap<String, CircuitState> {
        self.circuits.get_states()
    }

    pub fn reset_circuit(&self, name: &str) {
        self.circuits.reset_circuit(name);
    }

    pub fn reset_all_circuits(&self) {
        self.circuits.reset_all();
    }

    pub fn get_metrics(&self) -> ResilienceMetrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn update_retry_config(&mut self, retry: RetryConfig) {
        self.default_retry = retry;
    }

    pub fn update_timeout_config(&mut self, timeout_ms: u64) {
        self.default_timeout_ms = timeout_ms;
    }
}

/// Runs `op` wrapped, outside-in, by timeout, circuit breaking and retry,
/// optionally wrapped again by `options.fallback_chain` whose primary is
/// that whole stack. If the manager is disabled, runs `op` exactly once with
/// no wrapping at all.
pub async fn execute_with_resilience<T, E, F, Fut>(
    manager: &ResilienceManager,
    mut op: F,
    mut options: ResilienceOptions<T, E>,
) -> Result<T, ResilienceError<E>>
where
    E: ClassifiableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !manager.is_enabled() {
        return op().await.map_err(|err| {
            let classified = manager.classifier.classify_dyn(&err, None);
            ResilienceError::Classified(rsl_retry::RetryFailure {
                attempts: 1,
                classified,
                source: err,
            })
        });
    }

    let started = Instant::now();
    let chain = options.fallback_chain.take();
    let attempts = AtomicU32::new(0);

    let result = match chain {
        None => run_stack(manager, &mut op, &options, &attempts).await,
        Some(chain) => {
            let recovery = manager.recovery.clone();
            let fallback_metrics = manager.metrics.clone();
            let mut fallback_listeners = EventListeners::new();
            fallback_listeners.add(FnListener::new(move |event: &FallbackEvent| match event {
                FallbackEvent::Used { from, to, .. } => {
                    fallback_metrics.record_fallback_used();
                    recovery.emit(RecoveryEvent::Fallback {
                        from: from.clone(),
                        to: to.clone(),
                        timestamp: Instant::now(),
                    });
                }
                FallbackEvent::Degraded { reason, .. } => recovery.emit(RecoveryEvent::Degraded {
                    reason: reason.clone(),
                    timestamp: Instant::now(),
                }),
                FallbackEvent::Success { .. } => {}
            }));
            let cancel = TokenCancellation(options.cancel.as_ref());

            execute_fallback_chain(
                || run_stack(manager, &mut op, &options, &attempts),
                &chain,
                &manager.classifier,
                options.provider.as_deref(),
                &cancel,
                &fallback_listeners,
            )
            .await
            .map_err(|err| match err {
                FallbackError::Cancelled => ResilienceError::Cancelled,
                FallbackError::AllFailed { primary, .. } => primary,
            })
        }
    };

    let attempts = attempts.load(Ordering::Relaxed).max(1);
    record_outcome(manager, &options.operation_name, started, attempts, &result);
    result
}

async fn run_stack<T, E, F, Fut>(
    manager: &ResilienceManager,
    op: &mut F,
    options: &ResilienceOptions<T, E>,
    attempts_out: &AtomicU32,
) -> Result<T, ResilienceError<E>>
where
    E: ClassifiableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let cancel = TokenCancellation(options.cancel.as_ref());
    if cancel.is_cancelled() {
        return Err(ResilienceError::Cancelled);
    }

    let mut retry_config = options.retry.clone().unwrap_or_else(|| manager.default_retry.clone());
    if options.skip_retry {
        retry_config.max_attempts = 1;
    }

    let retry_event_name = options.operation_name.clone();
    let recovery = manager.recovery.clone();
    let mut retry_listeners = EventListeners::new();
    retry_listeners.add(FnListener::new(move |event: &RetryEvent| {
        recovery.emit(RecoveryEvent::Retry {
            operation_name: retry_event_name.clone(),
            attempt: event.attempt,
            delay_ms: event.delay_ms,
            category: event.category,
            timestamp: Instant::now(),
        });
    }));

    let provider = options.provider.as_deref();
    let operation_name = options.operation_name.clone();

    let retry_fut = with_retry(
        op,
        &retry_config,
        &manager.classifier,
        &operation_name,
        provider,
        &cancel,
        &retry_listeners,
    );

    let timeout_ms = options
        .timeout_ms
        .or_else(|| options.operation_type.map(OperationType::default_timeout_ms))
        .unwrap_or(manager.default_timeout_ms);
    let timeout_opts = TimeoutOptions {
        operation_name: Some(operation_name.clone()),
        cancel: options.cancel.clone(),
    };

    let circuit_key = options.circuit_key();
    match (options.skip_circuit_breaker, circuit_key) {
        (true, _) | (false, None) => {
            let outcome: Result<Result<(T, u32), RetryError<E>>, TimeoutError> =
                with_timeout(retry_fut, timeout_ms, timeout_opts).await;
            flatten_retry(outcome, attempts_out)
        }
        (false, Some(key)) => {
            let breaker = manager.circuits.get_circuit(&key, options.circuit);
            let circuit_fut = breaker.execute(|| retry_fut);
            let outcome: Result<Result<(T, u32), CircuitError<RetryError<E>>>, TimeoutError> =
                with_timeout(circuit_fut, timeout_ms, timeout_opts).await;
            flatten_circuit(outcome, attempts_out)
        }
    }
}

fn flatten_retry<T, E>(
    outcome: Result<Result<(T, u32), RetryError<E>>, TimeoutError>,
    attempts_out: &AtomicU32,
) -> Result<T, ResilienceError<E>> {
    match outcome {
        Err(timeout_err) => Err(ResilienceError::TimedOut(timeout_err)),
        Ok(Ok((value, attempts))) => {
            attempts_out.store(attempts, Ordering::Relaxed);
            Ok(value)
        }
        Ok(Err(RetryError::Cancelled { .. })) => Err(ResilienceError::Cancelled),
        Ok(Err(RetryError::Failed(failure))) => {
            attempts_out.store(failure.attempts, Ordering::Relaxed);
            Err(ResilienceError::Classified(failure))
        }
    }
}

fn flatten_circuit<T, E>(
    outcome: Result<Result<(T, u32), CircuitError<RetryError<E>>>, TimeoutError>,
    attempts_out: &AtomicU32,
) -> Result<T, ResilienceError<E>> {
    match outcome {
        Err(timeout_err) => Err(ResilienceError::TimedOut(timeout_err)),
        Ok(Ok((value, attempts))) => {
            attempts_out.store(attempts, Ordering::Relaxed);
            Ok(value)
        }
        Ok(Err(CircuitError::Open(open_err))) => Err(ResilienceError::CircuitOpen(open_err)),
        Ok(Err(CircuitError::Inner(RetryError::Cancelled { .. }))) => Err(ResilienceError::Cancelled),
        Ok(Err(CircuitError::Inner(RetryError::Failed(failure)))) => {
            attempts_out.store(failure.attempts, Ordering::Relaxed);
            Err(ResilienceError::Classified(failure))
        }
    }
}

fn record_outcome<T, E>(
    manager: &ResilienceManager,
    operation_name: &str,
    started: Instant,
    attempts: u32,
    result: &Result<T, ResilienceError<E>>,
) where
    E: ClassifiableError,
{
    let elapsed_ms = started.elapsed().as_millis() as u64;
    manager.metrics.record_attempts(attempts);
    match result {
        Ok(_) => {
            manager.metrics.record_success(elapsed_ms);
            manager.recovery.emit(RecoveryEvent::Recovered {
                operation_name: operation_name.to_string(),
                after_ms: elapsed_ms,
                attempts,
                timestamp: Instant::now(),
            });
        }
        Err(err) => {
            let classified = err.classified(&manager.classifier);
            manager.metrics.record_failure(classified.category());

            #[cfg(feature = "tracing")]
            tracing::debug!(operation_name, category = %classified.category(), "resilience call failed");

            manager.recovery.emit(RecoveryEvent::Failed {
                operation_name: operation_name.to_string(),
                category: classified.category(),
                message: classified.message().to_string(),
                exhausted: matches!(err, ResilienceError::Classified(_)),
                timestamp: Instant::now(),
            });
        }
    }
}
