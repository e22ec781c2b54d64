//! Capped exponential backoff with jitter for failed poll cycles.

use std::time::Duration;
use rand::Rng;

/// Delay before the next cycle after `failures` consecutive failed cycles.
///
/// The first failure waits `base`, each further failure doubles it, and the
/// result (jitter included) never exceeds `max`. With `base == max` this is a
/// fixed retry interval.
pub fn calculate_backoff(failures: u32, base: Duration, max: Duration) -> Duration {
    if failures == 0 {
        return base.min(max);
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let exponential = 2u64.saturating_pow(failures - 1);
    let capped_delay = base_ms.saturating_mul(exponential).min(max_ms);

    // Up to 10% jitter.
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter).min(max_ms))
}
