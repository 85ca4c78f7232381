//! Bounded retry policy for Riot API calls.
//!
//! This is the single place backoff is defined; every outbound request is
//! funneled through [`RetryPolicy::run`] so the policy stays uniform.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::types::RiotApiError;

/// Waits applied when the server rate-limits us without an explicit
/// `Retry-After`, keyed on the `X-Rate-Limit-Type` hint. The substring match
/// is a heuristic carried over as-is; calibrate against the live API
/// documentation before tightening.
const APP_SCOPE_WAIT: Duration = Duration::from_secs(60);
const METHOD_SCOPE_WAIT: Duration = Duration::from_secs(30);
const UNKNOWN_SCOPE_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

impl RetryPolicy {
    /// Drive `operation` until it succeeds, fails permanently, or the attempt
    /// cap is reached.
    ///
    /// Rate-limited responses honor the server-provided wait when present and
    /// fall back to the scope heuristic otherwise. Transient failures back
    /// off progressively. Both kinds consume attempts from the same cap;
    /// exhausting it yields [`RiotApiError::RetriesExhausted`], which callers
    /// treat as "this one item failed", never as a fatal job error.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, RiotApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RiotApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let wait = match &err {
                        RiotApiError::RateLimited { retry_after, scope } => {
                            rate_limited_wait(*retry_after, scope.as_deref())
                        }
                        RiotApiError::Transient { .. } | RiotApiError::Http(_) => {
                            transient_wait(attempt)
                        }
                        _ => return Err(err),
                    };

                    if attempt >= self.max_attempts {
                        warn!(attempts = attempt, "giving up on request: {err}");
                        return Err(RiotApiError::RetriesExhausted { attempts: attempt });
                    }

                    debug!(
                        attempt,
                        wait_secs = wait.as_secs(),
                        "request failed, retrying: {err}"
                    );
                    sleep(wait).await;
                }
            }
        }
    }
}

fn rate_limited_wait(retry_after: Option<u64>, scope: Option<&str>) -> Duration {
    if let Some(secs) = retry_after {
        return Duration::from_secs(secs);
    }
    match scope {
        Some(s) if s.contains("application") => APP_SCOPE_WAIT,
        Some(s) if s.contains("method") => METHOD_SCOPE_WAIT,
        _ => UNKNOWN_SCOPE_WAIT,
    }
}

/// 5s, 8s, 11s, ... capped at 30s for the `attempt`-th consecutive failure.
fn transient_wait(attempt: u32) -> Duration {
    Duration::from_secs((5 + 3 * u64::from(attempt.saturating_sub(1))).min(30))
}
