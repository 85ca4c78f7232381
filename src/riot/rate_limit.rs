//! Dual sliding-window rate limiter shared by every outbound Riot API call.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep};

const SHORT_WINDOW: Duration = Duration::from_secs(1);
const LONG_WINDOW: Duration = Duration::from_secs(120);

/// Quota caps for the two windows. Defaults mirror the development-key
/// limits: 20 requests per second, 100 per two minutes.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub per_second: usize,
    pub per_two_minutes: usize,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_second: 20,
            per_two_minutes: 100,
        }
    }
}

/// Admission control for the Riot API quota.
///
/// [`RateLimiter::acquire`] blocks until issuing one more request keeps both
/// sliding windows under their caps, then records the request. Admission
/// bookkeeping happens under the lock; the sleep itself never does, so
/// concurrent callers can still be admitted while one waits. Both windows are
/// re-validated after every sleep.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    windows: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    short: VecDeque<Instant>,
    long: VecDeque<Instant>,
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        while self
            .short
            .front()
            .is_some_and(|t| now.duration_since(*t) >= SHORT_WINDOW)
        {
            self.short.pop_front();
        }
        while self
            .long
            .front()
            .is_some_and(|t| now.duration_since(*t) >= LONG_WINDOW)
        {
            self.long.pop_front();
        }
    }

    /// Time until a slot opens, or `None` if one is free right now.
    fn wait_needed(&self, now: Instant, limits: &RateLimits) -> Option<Duration> {
        if self.short.len() >= limits.per_second {
            let oldest = *self.short.front()?;
            return Some(SHORT_WINDOW.saturating_sub(now.duration_since(oldest)));
        }
        if self.long.len() >= limits.per_two_minutes {
            let oldest = *self.long.front()?;
            return Some(LONG_WINDOW.saturating_sub(now.duration_since(oldest)));
        }
        None
    }

    fn record(&mut self, now: Instant) {
        self.short.push_back(now);
        self.long.push_back(now);
    }
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Wait until one request may be issued, then record it.
    ///
    /// Always admits the caller eventually: the wait is bounded by the
    /// longest window.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().expect("rate limiter lock poisoned");
                let now = Instant::now();
                windows.prune(now);
                match windows.wait_needed(now, &self.limits) {
                    None => {
                        windows.record(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_short_cap_without_waiting() {
        let limiter = RateLimiter::new(RateLimits {
            per_second: 3,
            per_two_minutes: 100,
        });

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn short_window_overflow_waits_one_second() {
        let limiter = RateLimiter::new(RateLimits {
            per_second: 3,
            per_two_minutes: 100,
        });

        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= SHORT_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn long_window_overflow_waits_for_expiry() {
        let limiter = RateLimiter::new(RateLimits {
            per_second: 100,
            per_two_minutes: 5,
        });

        let start = Instant::now();
        for _ in 0..6 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= LONG_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn no_sliding_window_ever_exceeds_the_cap() {
        let limiter = RateLimiter::new(RateLimits {
            per_second: 2,
            per_two_minutes: 100,
        });

        let mut admissions = Vec::new();
        for _ in 0..8 {
            limiter.acquire().await;
            admissions.push(Instant::now());
        }

        // With a cap of 2, any 3 consecutive admissions must span >= 1s.
        for run in admissions.windows(3) {
            assert!(run[2].duration_since(run[0]) >= SHORT_WINDOW);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_respect_the_bound() {
        let limiter = Arc::new(RateLimiter::new(RateLimits {
            per_second: 2,
            per_two_minutes: 100,
        }));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut admissions = Vec::new();
        for handle in handles {
            admissions.push(handle.await.unwrap());
        }
        admissions.sort();

        for run in admissions.windows(3) {
            assert!(run[2].duration_since(run[0]) >= SHORT_WINDOW);
        }
    }
}
