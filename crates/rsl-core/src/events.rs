//! Shared event bus used by every resilience and worktree component.
//!
//! Components never call listeners directly; they emit typed events (retry
//! attempts, circuit transitions, merge conflicts, ...) through an
//! [`EventListeners`] collection so the event sink contract in the external
//! interfaces stays uniform no matter which engine produced the event.

#[cfg(feature = "tracing")]
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by a resilience or worktree component.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// Machine-readable event discriminant, e.g. `"circuit.state_change"`.
    fn event_type(&self) -> &'static str;

    /// When the underlying state change or decision occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that produced the event (a circuit
    /// name, an operation name, a worktree task id, ...).
    fn source(&self) -> &str;
}

/// Receives events of a single concrete type.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// A boxed, shareable listener.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// An ordered collection of listeners for one event type.
///
/// Delivery is synchronous and in registration order. A listener that panics
/// is isolated: the panic is caught, the remaining listeners still run, and
/// the panic never escapes into the component that called [`emit`](Self::emit) —
/// state mutation always happens independently of (and before) event
/// delivery, so a broken listener cannot cause a state change to be lost.
#[derive(Clone)]
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Adds an already-boxed listener, e.g. one shared across registries.
    pub fn add_boxed(&mut self, listener: BoxedEventListener<E>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if let Err(_payload) = outcome {
                #[cfg(feature = "tracing")]
                warn_listener_panic(index, event, _payload.as_ref());

                #[cfg(feature = "metrics")]
                count_listener_panic(event);

                #[cfg(not(feature = "tracing"))]
                let _ = index;

                #[cfg(not(any(feature = "tracing", feature = "metrics")))]
                let _ = _payload;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a plain closure into an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _marker: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(feature = "tracing")]
fn warn_listener_panic<E: ResilienceEvent>(index: usize, event: &E, payload: &(dyn Any + Send)) {
    let message = payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    tracing::warn!(
        listener_index = index,
        source = event.source(),
        event_type = event.event_type(),
        panic_message = %message,
        "event listener panicked"
    );
}

#[cfg(feature = "metrics")]
fn count_listener_panic<E: ResilienceEvent>(event: &E) {
    metrics::counter!(
        "rsl_event_listener_panics_total",
        "source" => event.source().to_string(),
        "event_type" => event.event_type().to_string()
    )
    .increment(1);
}
