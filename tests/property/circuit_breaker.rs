//! Property tests over `rsl-circuit`'s admission state machine.

use proptest::prelude::*;
use rsl_circuit::{CircuitBreaker, CircuitConfig, CircuitState};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Once total calls and failures both clear their thresholds, the
    /// breaker is always open, whatever the threshold values were.
    #[test]
    fn failing_past_both_thresholds_always_opens(
        failure_threshold in 1u32..10,
        volume_threshold in 1u32..10,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let config = CircuitConfig::builder()
                .failure_threshold(failure_threshold)
                .volume_threshold(volume_threshold)
                .open_timeout_ms(60_000)
                .build()
                .unwrap();
            let breaker = CircuitBreaker::new("svc", config);

            let calls_needed = failure_threshold.max(volume_threshold);
            for _ in 0..calls_needed {
                let _ = breaker.execute::<(), &str, _, _>(|| async { Err("boom") }).await;
            }

            prop_assert_eq!(breaker.state(), CircuitState::Open);
            Ok(())
        })?;
    }

    /// An open circuit always denies admission before its timeout elapses,
    /// no matter how the timeout itself is configured.
    #[test]
    fn open_circuit_denies_admission_before_its_timeout(open_timeout_ms in 1_000u64..60_000) {
        let rt = runtime();
        rt.block_on(async {
            let config = CircuitConfig::builder()
                .failure_threshold(1)
                .volume_threshold(1)
                .open_timeout_ms(open_timeout_ms)
                .build()
                .unwrap();
            let breaker = CircuitBreaker::new("svc", config);
            let _ = breaker.execute::<(), &str, _, _>(|| async { Err("boom") }).await;

            prop_assert_eq!(breaker.state(), CircuitState::Open);
            prop_assert!(!breaker.can_execute());
            Ok(())
        })?;
    }

    /// A breaker that only ever sees successes never leaves the closed
    /// state, regardless of how many calls go through.
    #[test]
    fn all_successes_never_opens_the_circuit(call_count in 1u32..50) {
        let rt = runtime();
        rt.block_on(async {
            let config = CircuitConfig::builder().failure_threshold(1).volume_threshold(1).build().unwrap();
            let breaker = CircuitBreaker::new("svc", config);
            for _ in 0..call_count {
                let _ = breaker.execute::<(), std::convert::Infallible, _, _>(|| async { Ok(()) }).await;
            }
            prop_assert_eq!(breaker.state(), CircuitState::Closed);
            Ok(())
        })?;
    }
}
