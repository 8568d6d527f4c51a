use rsl_classifier::ErrorCategory;
use rsl_core::DurationRing;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const RECOVERY_WINDOW: usize = 100;

/// Point-in-time snapshot of [`ManagerMetrics`], cheap to clone and hand to
/// a caller.
#[derive(Debug, Clone)]
pub struct ResilienceMetrics {
    pub total_attempts: u64,
    pub successful_retries: u64,
    pub failed_retries: u64,
    pub circuit_opens: u64,
    pub fallbacks_used: u64,
    pub errors_by_category: HashMap<ErrorCategory, u64>,
    pub avg_recovery_time_ms: f64,
}

/// Running counters behind [`crate::ResilienceManager::get_metrics`].
/// "successful_retries" counts every successful terminal outcome, including
/// a call that needed zero retries, since that is the only definition a
/// single counter supports without also tracking per-call retry counts.
/// "total_attempts" is the real sum of every `op` invocation across every
/// call, successful or not.
pub(crate) struct ManagerMetrics {
    total_attempts: AtomicU64,
    successful_retries: AtomicU64,
    failed_retries: AtomicU64,
    circuit_opens: AtomicU64,
    fallbacks_used: AtomicU64,
    errors_by_category: Mutex<HashMap<ErrorCategory, u64>>,
    recovery_times: Mutex<DurationRing>,
}

impl ManagerMetrics {
    pub(crate) fn new() -> Self {
        Self {
            total_attempts: AtomicU64::new(0),
            successful_retries: AtomicU64::new(0),
            failed_retries: AtomicU64::new(0),
            circuit_opens: AtomicU64::new(0),
            fallbacks_used: AtomicU64::new(0),
            errors_by_category: Mutex::new(HashMap::new()),
            recovery_times: Mutex::new(DurationRing::new(RECOVERY_WINDOW)),
        }
    }

    pub(crate) fn record_attempts(&self, attempts: u32) {
        self.total_attempts.fetch_add(attempts as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, duration_ms: u64) {
        self.successful_retries.fetch_add(1, Ordering::Relaxed);
        self.recovery_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration_ms);
    }

    pub(crate) fn record_failure(&self, category: ErrorCategory) {
        self.failed_retries.fetch_add(1, Ordering::Relaxed);
        *self
            .errors_by_category
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(category)
            .or_insert(0) += 1;
    }

    pub(crate) fn record_circuit_open(&self) {
        self.circuit_opens.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback_used(&self) {
        self.fallbacks_used.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ResilienceMetrics {
        ResilienceMetrics {
            total_attempts: self.total_attempts.load(Ordering::Relaxed),
            successful_retries: self.successful_retries.load(Ordering::Relaxed),
            failed_retries: self.failed_retries.load(Ordering::Relaxed),
            circuit_opens: self.circuit_opens.load(Ordering::Relaxed),
            fallbacks_used: self.fallbacks_used.load(Ordering::Relaxed),
            errors_by_category: self.errors_by_category.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            avg_recovery_time_ms: self.recovery_times.lock().unwrap_or_else(|e| e.into_inner()).average(),
        }
    }

    pub(crate) fn reset(&self) {
        self.total_attempts.store(0, Ordering::Relaxed);
        self.successful_retries.store(0, Ordering::Relaxed);
        self.failed_retries.store(0, Ordering::Relaxed);
        self.circuit_opens.store(0, Ordering::Relaxed);
        self.fallbacks_used.store(0, Ordering::Relaxed);
        self.errors_by_category.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.recovery_times.lock().unwrap_or_else(|e| e.into_inner()).reset();
    }
}
