//! Cooldowns between requests so the site does not start blocking us.

use rand::Rng;
use std::time::Duration;

/// `floor(unit * (max - min)) + min` for `unit` in `[0, 1)`.
///
/// `max` itself is only reached when `min == max`.
pub fn sample_delay(min_secs: u64, max_secs: u64, unit: f64) -> u64 {
    let span = max_secs.saturating_sub(min_secs) as f64;
    (unit * span).floor() as u64 + min_secs
}

/// Draw a whole number of seconds between `min_secs` and `max_secs`
pub fn random_delay(min_secs: u64, max_secs: u64) -> u64 {
    let unit: f64 = rand::thread_rng().r#gen();
    sample_delay(min_secs, max_secs, unit)
}

pub async fn pause(secs: u64) {
    if secs > 0 {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

/// Sleep for a random number of seconds, returning how long it waited
pub async fn wait(min_secs: u64, max_secs: u64) -> u64 {
    let secs = random_delay(min_secs, max_secs);
    pause(secs).await;
    secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_delay_bounds() {
        assert_eq!(sample_delay(3, 10, 0.0), 3);
        assert_eq!(sample_delay(3, 10, 0.5), 6);
        assert_eq!(sample_delay(3, 10, 0.999_999), 9);
        assert_eq!(sample_delay(5, 5, 0.7), 5);
        assert_eq!(sample_delay(120, 600, 0.25), 240);
    }

    #[test]
    fn test_random_delay_in_range() {
        for _ in 0..1000 {
            let secs = random_delay(3, 10);
            assert!((3..=10).contains(&secs), "{} out of range", secs);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_sleeps_whole_seconds() {
        let start = tokio::time::Instant::now();
        pause(2).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_sampled_delay() {
        let start = tokio::time::Instant::now();
        let secs = wait(1, 3).await;

        assert!((1..=3).contains(&secs));
        assert!(start.elapsed() >= Duration::from_secs(secs));
        assert!(start.elapsed() < Duration::from_secs(secs) + Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_pause_returns_immediately() {
        pause(0).await;
        assert_eq!(wait(0, 0).await, 0);
    }
}
