use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use mailform_ratelimit_contracts::RateLimiterService;
use mailform_shared_contracts::time::TimeService;

/// Sliding window log rate limiter backed by a process-local map.
///
/// Keeps the individual admission timestamps per caller key and counts those
/// within the trailing window. The state is best effort by design: it resets
/// on process restart and is not shared across instances. Multi-instance
/// deployments swap in a shared store behind [`RateLimiterService`].
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter<Time> {
    time: Time,
    config: RateLimiterConfig,
    state: Arc<Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Admissions allowed per key within `window`.
    pub max_requests: usize,
    pub window: Duration,
}

impl<Time> InMemoryRateLimiter<Time> {
    pub fn new(time: Time, config: RateLimiterConfig) -> Self {
        Self {
            time,
            config,
            state: Default::default(),
        }
    }
}

impl<Time> RateLimiterService for InMemoryRateLimiter<Time>
where
    Time: TimeService,
{
    async fn admit(&self, key: &str) -> bool {
        let now = self.time.now();
        let cutoff = now - self.config.window;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamps = state.entry(key.to_owned()).or_default();

        while timestamps.front().is_some_and(|&ts| ts < cutoff) {
            timestamps.pop_front();
        }

        // Hard cap independent of the window logic, bounding memory for keys
        // whose entries outlive the pruning above.
        let cap = self.config.max_requests * 5;
        while timestamps.len() > cap {
            timestamps.pop_front();
        }

        if timestamps.len() >= self.config.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mailform_shared_contracts::time::MockTimeService;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(60 * 60);

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn limiter(time: MockTimeService, max_requests: usize) -> InMemoryRateLimiter<MockTimeService> {
        InMemoryRateLimiter::new(
            time,
            RateLimiterConfig {
                max_requests,
                window: WINDOW,
            },
        )
    }

    #[tokio::test]
    async fn admits_until_the_window_is_full() {
        // Arrange
        let now = base();
        let time = MockTimeService::new()
            .with_now(now)
            .with_now(now + Duration::from_secs(1))
            .with_now(now + Duration::from_secs(2))
            .with_now(now + Duration::from_secs(3));

        let sut = limiter(time, 3);

        // Act + Assert
        assert!(sut.admit("1.2.3.4").await);
        assert!(sut.admit("1.2.3.4").await);
        assert!(sut.admit("1.2.3.4").await);
        assert!(!sut.admit("1.2.3.4").await);
    }

    #[tokio::test]
    async fn admits_again_after_the_window_elapsed() {
        // Arrange
        let now = base();
        let time = MockTimeService::new()
            .with_now(now)
            .with_now(now + Duration::from_secs(1))
            .with_now(now + Duration::from_secs(2))
            .with_now(now + WINDOW + Duration::from_secs(2));

        let sut = limiter(time, 2);

        // Act + Assert
        assert!(sut.admit("1.2.3.4").await);
        assert!(sut.admit("1.2.3.4").await);
        assert!(!sut.admit("1.2.3.4").await);
        assert!(sut.admit("1.2.3.4").await);
    }

    #[tokio::test]
    async fn rejected_attempts_are_not_recorded() {
        // Arrange
        let now = base();
        let time = MockTimeService::new()
            .with_now(now)
            .with_now(now + Duration::from_secs(30))
            .with_now(now + WINDOW + Duration::from_secs(1));

        let sut = limiter(time, 1);

        // Act + Assert
        assert!(sut.admit("1.2.3.4").await);
        // Rejected at t+30; if this were recorded, the admission after the
        // window elapsed would still see one in-window entry and reject.
        assert!(!sut.admit("1.2.3.4").await);
        assert!(sut.admit("1.2.3.4").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        // Arrange
        let now = base();
        let time = MockTimeService::new()
            .with_now(now)
            .with_now(now + Duration::from_secs(1))
            .with_now(now + Duration::from_secs(2));

        let sut = limiter(time, 1);

        // Act + Assert
        assert!(sut.admit("1.2.3.4").await);
        assert!(!sut.admit("1.2.3.4").await);
        assert!(sut.admit("5.6.7.8").await);
    }
}
