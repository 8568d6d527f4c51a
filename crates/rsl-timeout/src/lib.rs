//! Caps operation duration and integrates with external cancellation.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    LlmCall,
    ToolExecution,
    FileRead,
    WebFetch,
    AgentSpawn,
}

impl OperationType {
    pub fn default_timeout_ms(self) -> u64 {
        match self {
            OperationType::LlmCall => 60_000,
            OperationType::ToolExecution => 120_000,
            OperationType::FileRead => 5_000,
            OperationType::WebFetch => 30_000,
            OperationType::AgentSpawn => 300_000,
        }
    }
}

/// Fallback when no [`OperationType`] and no explicit timeout were given.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
#[error("operation {operation_name:?} timed out after {timeout_ms}ms")]
pub struct TimeoutError {
    pub operation_name: Option<String>,
    pub timeout_ms: u64,
    pub cancelled: bool,
}

#[derive(Default, Clone)]
pub struct TimeoutOptions {
    pub operation_name: Option<String>,
    pub cancel: Option<CancellationToken>,
}

pub struct TimeoutOutcome<T> {
    pub success: bool,
    pub value: Option<T>,
    pub timed_out: bool,
    pub error: Option<TimeoutError>,
}

/// Races `op` against a `timeout_ms` timer. If `opts.cancel` is already
/// signaled on entry, fails immediately without ever polling `op`.
pub async fn with_timeout<T, Fut>(op: Fut, timeout_ms: u64, opts: TimeoutOptions) -> Result<T, TimeoutError>
where
    Fut: Future<Output = T>,
{
    if let Some(cancel) = &opts.cancel {
        if cancel.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!(operation = ?opts.operation_name, "timeout: cancelled before op started");
            return Err(TimeoutError {
                operation_name: opts.operation_name,
                timeout_ms,
                cancelled: true,
            });
        }
    }

    // A zero-timeout budget is a timeout outright, not a race op and sleep
    // could coincidentally win. tokio::select! polls branches in random
    // order, so a `timeout_ms == 0` sleep could lose to op at this instant.
    if timeout_ms == 0 {
        #[cfg(feature = "tracing")]
        tracing::debug!(operation = ?opts.operation_name, "timeout: zero budget, failing before op started");
        return Err(TimeoutError {
            operation_name: opts.operation_name,
            timeout_ms,
            cancelled: false,
        });
    }

    let sleep = tokio::time::sleep(Duration::from_millis(timeout_ms));
    tokio::pin!(sleep);
    tokio::pin!(op);

    let result = match &opts.cancel {
        Some(cancel) => tokio::select! {
            value = &mut op => Ok(value),
            _ = &mut sleep => Err(TimeoutError {
                operation_name: opts.operation_name.clone(),
                timeout_ms,
                cancelled: false,
            }),
            _ = cancel.cancelled() => Err(TimeoutError {
                operation_name: opts.operation_name.clone(),
                timeout_ms,
                cancelled: true,
            }),
        },
        None => tokio::select! {
            value = &mut op => Ok(value),
            _ = &mut sleep => Err(TimeoutError {
                operation_name: opts.operation_name.clone(),
                timeout_ms,
                cancelled: false,
            }),
        },
    };

    #[cfg(feature = "tracing")]
    if let Err(ref err) = result {
        tracing::debug!(operation = ?err.operation_name, timeout_ms, cancelled = err.cancelled, "timeout fired");
    }
    #[cfg(feature = "metrics")]
    if result.is_err() {
        metrics::counter!("rsl_timeout_fired_total").increment(1);
    }

    result
}

pub async fn with_timeout_safe<T, Fut>(op: Fut, timeout_ms: u64, opts: TimeoutOptions) -> TimeoutOutcome<T>
where
    Fut: Future<Output = T>,
{
    match with_timeout(op, timeout_ms, opts).await {
        Ok(value) => TimeoutOutcome {
            success: true,
            value: Some(value),
            timed_out: false,
            error: None,
        },
        Err(error) => TimeoutOutcome {
            success: false,
            value: None,
            timed_out: !error.cancelled,
            error: Some(error),
        },
    }
}

/// A token that self-trips after `ms` have elapsed, detaching a background
/// task to drive the timer.
pub fn create_deadline(ms: u64) -> CancellationToken {
    let token = CancellationToken::new();
    let tripper = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tripper.cancel();
    });
    token
}

/// Races a set of named operations, each against its own timeout; returns
/// the first named result to resolve (success or timeout).
pub async fn race_with_timeouts<T>(
    ops: Vec<(String, std::pin::Pin<Box<dyn Future<Output = T> + Send>>, u64)>,
) -> (String, Result<T, TimeoutError>) {
    let wrapped = ops.into_iter().map(|(name, fut, timeout_ms)| {
        Box::pin(async move {
            let opts = TimeoutOptions {
                operation_name: Some(name.clone()),
                cancel: None,
            };
            (name, with_timeout(fut, timeout_ms, opts).await)
        })
    });
    let (result, _index, _rest) = futures::future::select_all(wrapped).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_kills_a_long_operation() {
        let started = std::time::Instant::now();
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            },
            50,
            TimeoutOptions {
                operation_name: Some("slow-op".into()),
                cancel: None,
            },
        )
        .await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn zero_timeout_fires_before_op_observably_starts() {
        let observed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let observed_clone = observed.clone();
        let result = with_timeout(
            async move {
                observed_clone.store(true, std::sync::atomic::Ordering::SeqCst);
                tokio::task::yield_now().await;
            },
            0,
            TimeoutOptions::default(),
        )
        .await;
        assert!(result.is_err());
        assert!(!observed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn already_cancelled_token_fails_without_polling_op() {
        let token = CancellationToken::new();
        token.cancel();
        let polled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let polled_clone = polled.clone();

        let result = with_timeout(
            async move {
                polled_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            },
            5_000,
            TimeoutOptions {
                operation_name: None,
                cancel: Some(token),
            },
        )
        .await;

        assert!(result.unwrap_err().cancelled);
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn operation_type_defaults_match_the_table() {
        assert_eq!(OperationType::LlmCall.default_timeout_ms(), 60_000);
        assert_eq!(OperationType::ToolExecution.default_timeout_ms(), 120_000);
        assert_eq!(OperationType::FileRead.default_timeout_ms(), 5_000);
        assert_eq!(OperationType::WebFetch.default_timeout_ms(), 30_000);
        assert_eq!(OperationType::AgentSpawn.default_timeout_ms(), 300_000);
    }
}
