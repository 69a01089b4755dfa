//! Bounded retry with linearly escalating backoff.

use sbf_core::CrawlConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often an operation is attempted and how long to wait in between.
///
/// The wait before attempt `n` (0-based) is `n - 1` backoff units, so the
/// default policy sleeps 0s, 10s, 20s, 30s between five attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: E,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Policy from the `[crawl]` table.
    #[must_use]
    pub fn from_config(crawl: &CrawlConfig) -> Self {
        Self::new(crawl.max_attempts, crawl.backoff_unit())
    }

    /// Total attempts allowed.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sleep before 0-based attempt `attempt`. Zero for the first two.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt.saturating_sub(1)
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// `op` receives the 0-based attempt index. Each failure is logged at
    /// `error` with `label` and the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, RetryExhausted<E>>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(label, |_| true, op).await
    }

    /// Like [`run`](Self::run), but stops at the first error `retryable`
    /// rejects. `attempts` then counts the attempts actually made.
    pub async fn run_if<T, E, R, F, Fut>(
        &self,
        label: &str,
        retryable: R,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: Display,
        R: Fn(&E) -> bool,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!("Backing off {:?} before attempt {} for {}", delay, attempt + 1, label);
                tokio::time::sleep(delay).await;
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::error!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.max_attempts,
                        label,
                        e
                    );
                    attempt += 1;
                    if !retryable(&e) {
                        tracing::error!("Not retrying {}: failure is permanent", label);
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                    if attempt >= self.max_attempts {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlConfig::default())
    }
}
