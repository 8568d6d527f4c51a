/// A synchronous cancellation check shared by every component that honors
/// cancellation at its suspension points (retry backoff, timeout waits,
/// fallback iteration). `rsl-timeout` layers a richer
/// `tokio_util::sync::CancellationToken`-backed async wait on top of this for
/// components that need to wake promptly rather than poll.
pub trait Cancellation: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// The no-op cancellation source, for callers that never cancel.
impl Cancellation for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}
