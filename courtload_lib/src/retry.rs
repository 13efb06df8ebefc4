//! Pacing, exponential backoff and the retry loop shared by every outbound call.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::tracker::RequestTracker;

/// An error that knows whether repeating the request could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Raw `Retry-After` header value, when the failure carried one.
    fn retry_after(&self) -> Option<&str> {
        None
    }
}

impl Retryable for statsnba_api::Error {
    fn is_retryable(&self) -> bool {
        statsnba_api::Error::is_retryable(self)
    }

    fn retry_after(&self) -> Option<&str> {
        statsnba_api::Error::retry_after(self)
    }
}

/// Retry and pacing tunables for one upstream.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `max_retries + 1` attempts in total.
    pub max_retries: usize,
    /// Fixed wait before every physical request.
    pub request_delay: Duration,
    /// Upper bound of the random extra added to `request_delay`.
    pub pacing_jitter: Duration,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    /// Upper bound of the random extra added to each backoff. Never larger
    /// than `backoff_initial`, which keeps the backoff non-decreasing.
    pub backoff_jitter: Duration,
    /// Per-attempt wall-clock timeout.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Stats API tunables from `NBA_API_*` variables.
    pub fn nba_from_env() -> Self {
        Self::from_env(
            "NBA_API",
            Self {
                max_retries: 7,
                request_delay: Duration::from_millis(1500),
                pacing_jitter: Duration::ZERO,
                backoff_initial: Duration::from_secs(2),
                backoff_max: Duration::from_secs(120),
                backoff_jitter: Duration::from_secs(1),
                timeout: Duration::from_secs(60),
            },
        )
    }

    /// Scrape source tunables from `BBREF_*` variables.
    pub fn bbref_from_env() -> Self {
        Self::from_env(
            "BBREF",
            Self {
                max_retries: 8,
                request_delay: Duration::from_secs(2),
                pacing_jitter: Duration::from_secs(1),
                backoff_initial: Duration::from_secs(2),
                backoff_max: Duration::from_secs(120),
                backoff_jitter: Duration::from_secs(1),
                timeout: Duration::from_secs(15),
            },
        )
    }

    fn from_env(prefix: &str, defaults: Self) -> Self {
        let var = |name: &str| format!("{}_{}", prefix, name);
        Self {
            max_retries: env_usize(&var("MAX_RETRIES"), defaults.max_retries),
            request_delay: env_secs(&var("REQUEST_DELAY_SECONDS"), defaults.request_delay),
            pacing_jitter: env_secs(&var("REQUEST_JITTER_SECONDS"), defaults.pacing_jitter),
            backoff_initial: env_secs(&var("BACKOFF_INITIAL_SECONDS"), defaults.backoff_initial),
            backoff_max: env_secs(&var("BACKOFF_MAX_SECONDS"), defaults.backoff_max),
            backoff_jitter: env_secs(&var("JITTER_SECONDS"), defaults.backoff_jitter),
            timeout: env_secs(&var("TIMEOUT_SECONDS"), defaults.timeout),
        }
        .clamped()
    }

    /// A policy with no pacing and no randomness, for tests and local mocks.
    pub fn immediate(max_retries: usize) -> Self {
        Self {
            max_retries,
            request_delay: Duration::ZERO,
            pacing_jitter: Duration::ZERO,
            backoff_initial: Duration::from_millis(10),
            backoff_max: Duration::from_secs(1),
            backoff_jitter: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    fn clamped(mut self) -> Self {
        if self.backoff_jitter > self.backoff_initial {
            self.backoff_jitter = self.backoff_initial;
        }
        if self.backoff_max < self.backoff_initial {
            self.backoff_max = self.backoff_initial;
        }
        self
    }

    /// Backoff before retry `retry` (0-indexed) with an explicit jitter
    /// value: `min(initial * 2^retry + jitter, max)`.
    pub fn backoff_with_jitter(&self, retry: usize, jitter: Duration) -> Duration {
        let shift = retry.min(30) as u32;
        let base = self
            .backoff_initial
            .checked_mul(1u32 << shift)
            .unwrap_or(self.backoff_max);
        base.saturating_add(jitter.min(self.backoff_jitter))
            .min(self.backoff_max)
    }

    /// Backoff before retry `retry` with a freshly drawn jitter.
    pub fn backoff(&self, retry: usize) -> Duration {
        self.backoff_with_jitter(retry, random_up_to(self.backoff_jitter))
    }

    /// Wait before retry `retry` given the failed response's `Retry-After`.
    ///
    /// A numeric header wins over a shorter computed backoff but never
    /// exceeds `backoff_max`. Anything unparsable is ignored.
    pub fn wait_with_retry_after(&self, backoff: Duration, retry_after: Option<&str>) -> Duration {
        match retry_after.and_then(parse_retry_after) {
            Some(ra) => ra.max(backoff).min(self.backoff_max),
            None => backoff,
        }
    }

    /// Pacing delay before one physical request.
    pub fn pacing(&self) -> Duration {
        self.request_delay + random_up_to(self.pacing_jitter)
    }
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs))
}

fn random_up_to(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..max.as_secs_f64()))
}

/// Runs `operation` under `policy`: paces before every attempt, retries
/// retryable failures with backoff, and returns the last error once the
/// retries are spent. Non-retryable errors return immediately.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    tracker: &RequestTracker,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0usize;
    loop {
        let pace = policy.pacing();
        if !pace.is_zero() {
            sleep(pace).await;
        }
        tracing::debug!("GET {} attempt={}/{}", label, retry + 1, policy.max_retries + 1);

        match operation().await {
            Ok(value) => {
                tracker.record_success();
                return Ok(value);
            }
            Err(err) if err.is_retryable() && retry < policy.max_retries => {
                tracker.record_retry();
                let wait = policy.wait_with_retry_after(policy.backoff(retry), err.retry_after());
                tracing::warn!(
                    "{} failed ({}), attempt {}/{}, retrying in {:.1}s",
                    label,
                    err,
                    retry + 1,
                    policy.max_retries + 1,
                    wait.as_secs_f64()
                );
                tracker.record_backoff(wait);
                sleep(wait).await;
                retry += 1;
            }
            Err(err) => {
                tracker.record_failure();
                return Err(err);
            }
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(default)
}
