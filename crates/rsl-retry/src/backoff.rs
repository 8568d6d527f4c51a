//! Delay computation for retry attempts.
//!
//! `tower-resilience-retry` exposes `ExponentialBackoff`, `FixedInterval`,
//! and `FnInterval` as its public backoff surface; this module reconstructs
//! that shape for the closure-based retry runner, since the strategy itself
//! (exponential-with-cap, randomized jitter) is identical to what that crate
//! documents.

use rand::Rng;

/// Computes the delay before the next attempt, given the zero-based index
/// of the attempt that just failed.
pub trait IntervalFunction: Send + Sync {
    fn delay_ms(&self, attempt_index: u32) -> u64;
}

/// `base = min(initial * multiplier^i, max)`, no randomization.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl IntervalFunction for ExponentialBackoff {
    fn delay_ms(&self, attempt_index: u32) -> u64 {
        exponential_base(
            self.initial_delay_ms,
            self.max_delay_ms,
            self.multiplier,
            attempt_index,
        )
    }
}

/// `base` per [`ExponentialBackoff`], then `base +- base * jitter_factor * U(-1, 1)`,
/// floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialRandomBackoff {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter_factor: f64,
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn delay_ms(&self, attempt_index: u32) -> u64 {
        let base = exponential_base(
            self.initial_delay_ms,
            self.max_delay_ms,
            self.multiplier,
            attempt_index,
        );
        apply_jitter(base, self.jitter_factor)
    }
}

/// A constant delay regardless of attempt index.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    pub delay_ms: u64,
}

impl IntervalFunction for FixedInterval {
    fn delay_ms(&self, _attempt_index: u32) -> u64 {
        self.delay_ms
    }
}

/// A caller-supplied delay function, for strategies the table above doesn't
/// cover.
pub struct FnInterval<F>(pub F)
where
    F: Fn(u32) -> u64 + Send + Sync;

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(u32) -> u64 + Send + Sync,
{
    fn delay_ms(&self, attempt_index: u32) -> u64 {
        (self.0)(attempt_index)
    }
}

fn exponential_base(initial_delay_ms: u64, max_delay_ms: u64, multiplier: f64, attempt_index: u32) -> u64 {
    let scaled = initial_delay_ms as f64 * multiplier.powi(attempt_index as i32);
    scaled.min(max_delay_ms as f64).round() as u64
}

fn apply_jitter(base: u64, jitter_factor: f64) -> u64 {
    if jitter_factor <= 0.0 {
        return base;
    }
    let sign: f64 = rand::rng().random_range(-1.0..=1.0);
    let jitter = base as f64 * jitter_factor * sign;
    (base as f64 + jitter).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_caps_at_max_delay() {
        let backoff = ExponentialBackoff {
            initial_delay_ms: 10,
            max_delay_ms: 50,
            multiplier: 2.0,
        };
        assert_eq!(backoff.delay_ms(0), 10);
        assert_eq!(backoff.delay_ms(1), 20);
        assert_eq!(backoff.delay_ms(2), 40);
        assert_eq!(backoff.delay_ms(3), 50); // would be 80, capped
    }

    #[test]
    fn zero_jitter_factor_yields_exactly_base() {
        for _ in 0..20 {
            assert_eq!(apply_jitter(100, 0.0), 100);
        }
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let base = 100u64;
        let jitter_factor = 0.3;
        for _ in 0..200 {
            let delayed = apply_jitter(base, jitter_factor);
            let lower = (base as f64 * (1.0 - jitter_factor)).max(0.0).floor() as u64;
            let upper = (base as f64 * (1.0 + jitter_factor)).ceil() as u64;
            assert!(
                delayed >= lower && delayed <= upper,
                "{delayed} not in [{lower}, {upper}]"
            );
        }
    }

    #[test]
    fn fixed_interval_ignores_attempt_index() {
        let fixed = FixedInterval { delay_ms: 250 };
        assert_eq!(fixed.delay_ms(0), 250);
        assert_eq!(fixed.delay_ms(9), 250);
    }
}
