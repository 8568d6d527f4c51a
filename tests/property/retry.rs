//! Property tests over the backoff strategies backing `rsl-retry`.

use proptest::prelude::*;
use rsl_retry::{ExponentialBackoff, ExponentialRandomBackoff, IntervalFunction};

proptest! {
    /// The undithered exponential curve never exceeds its configured cap,
    /// regardless of how many attempts have elapsed.
    #[test]
    fn exponential_backoff_never_exceeds_max_delay(
        initial in 1u64..1_000,
        max in 1u64..60_000,
        multiplier in 1.0f64..4.0,
        attempt_index in 0u32..20,
    ) {
        let backoff = ExponentialBackoff {
            initial_delay_ms: initial,
            max_delay_ms: max,
            multiplier,
        };
        prop_assert!(backoff.delay_ms(attempt_index) <= max);
    }

    /// Delay is non-decreasing in the attempt index up to the point it caps,
    /// since the curve is monotonic before clamping.
    #[test]
    fn exponential_backoff_is_monotonic_in_attempt_index(
        initial in 1u64..1_000,
        max in 10_000u64..120_000,
        multiplier in 1.0f64..4.0,
        attempt_index in 0u32..15,
    ) {
        let backoff = ExponentialBackoff {
            initial_delay_ms: initial,
            max_delay_ms: max,
            multiplier,
        };
        prop_assert!(backoff.delay_ms(attempt_index) <= backoff.delay_ms(attempt_index + 1));
    }

    /// Jittered delay always stays within the cap too, however the random
    /// sign lands.
    #[test]
    fn jittered_backoff_never_exceeds_max_delay(
        initial in 1u64..1_000,
        max in 1u64..60_000,
        multiplier in 1.0f64..4.0,
        jitter_factor in 0.0f64..1.0,
        attempt_index in 0u32..20,
    ) {
        let backoff = ExponentialRandomBackoff {
            initial_delay_ms: initial,
            max_delay_ms: max,
            multiplier,
            jitter_factor,
        };
        for _ in 0..10 {
            let delay = backoff.delay_ms(attempt_index);
            let bound = (max as f64 * (1.0 + jitter_factor)).ceil() as u64;
            prop_assert!(delay <= bound);
        }
    }

    /// A zero jitter factor always reproduces the undithered curve exactly.
    #[test]
    fn zero_jitter_matches_the_plain_exponential_curve(
        initial in 1u64..1_000,
        max in 1u64..60_000,
        multiplier in 1.0f64..4.0,
        attempt_index in 0u32..20,
    ) {
        let plain = ExponentialBackoff { initial_delay_ms: initial, max_delay_ms: max, multiplier };
        let jittered = ExponentialRandomBackoff {
            initial_delay_ms: initial,
            max_delay_ms: max,
            multiplier,
            jitter_factor: 0.0,
        };
        prop_assert_eq!(plain.delay_ms(attempt_index), jittered.delay_ms(attempt_index));
    }
}
