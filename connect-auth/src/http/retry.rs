//! Capped exponential backoff for opt-in backchannel retries.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

/// Retries transient failures after `base * 2^n`, never waiting longer than `max_delay`,
/// and gives up once the elapsed time since the first attempt exceeds `max_elapsed`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    max_elapsed: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_elapsed: Duration::from_secs(30),
        }
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    fn delay_for(&self, n_past_retries: u32) -> Duration {
        let factor = 2_u32.saturating_pow(n_past_retries);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        let elapsed = request_start_time.elapsed().unwrap_or_default();
        if n_past_retries >= self.max_retries || elapsed >= self.max_elapsed {
            return RetryDecision::DoNotRetry;
        }
        RetryDecision::Retry {
            execute_after: SystemTime::now() + self.delay_for(n_past_retries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = BackoffPolicy::new(3).with_delays(Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = BackoffPolicy::new(50);
        assert_eq!(policy.delay_for(40), policy.max_delay);
    }

    #[test]
    fn test_stops_after_max_retries() {
        let policy = BackoffPolicy::new(2);
        let now = SystemTime::now();
        assert!(matches!(policy.should_retry(now, 1), RetryDecision::Retry { .. }));
        assert!(matches!(policy.should_retry(now, 2), RetryDecision::DoNotRetry));
    }

    #[test]
    fn test_stops_after_elapsed_budget() {
        let policy = BackoffPolicy::new(5);
        let long_ago = SystemTime::now() - Duration::from_secs(60);
        assert!(matches!(policy.should_retry(long_ago, 0), RetryDecision::DoNotRetry));
    }
}
