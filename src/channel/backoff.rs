//! Exponential backoff arithmetic.

use std::time::Duration;

/// Delay before the retry that follows `retry_count` consecutive failures.
///
/// `base * 2^retry_count`, saturating instead of overflowing.
#[inline]
#[must_use]
pub fn retry_delay(base: Duration, retry_count: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_ladder() {
        let base = Duration::from_millis(1000);
        let ladder: Vec<_> = (0..3).map(|n| retry_delay(base, n)).collect();
        assert_eq!(
            ladder,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[test]
    fn test_zero_base_never_waits() {
        assert_eq!(retry_delay(Duration::ZERO, 10), Duration::ZERO);
    }

    #[test]
    fn test_saturates_on_huge_exponent() {
        let delay = retry_delay(Duration::from_secs(1), u32::MAX);
        assert_eq!(delay, Duration::from_secs(1).saturating_mul(u32::MAX));
    }

    proptest! {
        #[test]
        fn prop_delay_is_base_times_power_of_two(base_ms in 0u64..60_000, n in 0u32..20) {
            let base = Duration::from_millis(base_ms);
            prop_assert_eq!(retry_delay(base, n), Duration::from_millis(base_ms << n));
        }

        #[test]
        fn prop_each_step_doubles(base_ms in 1u64..60_000, n in 0u32..20) {
            let base = Duration::from_millis(base_ms);
            prop_assert_eq!(retry_delay(base, n + 1), retry_delay(base, n) * 2);
        }
    }
}
