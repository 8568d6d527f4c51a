//! Event and metrics primitives shared by the resilience engine
//! (classifier, retry, circuit, timeout, fallback, manager) and the git
//! worktree/merge engine. Carries no domain knowledge of either.

mod cancellation;
mod events;
mod metrics;

pub use cancellation::Cancellation;
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
pub use metrics::DurationRing;
