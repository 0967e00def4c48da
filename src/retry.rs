//! Retry policy with exponential backoff and jitter (C1).
//!
//! Wraps a fallible async operation in bounded retries. On failure, sleeps
//! `d + jitter` where `d` starts at `initial_delay` and is multiplied by
//! `backoff_factor` after every attempt, and `jitter` is uniform in
//! `[-0.1*d, +0.1*d]`. After `retries` failures the last error is returned.
//! A cancellation signal observed via `cancel` is propagated immediately,
//! without sleeping.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Retry/backoff configuration.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Number of retry attempts beyond the first (total attempts = retries + 1).
    pub retries: u32,
    /// Seconds before the first retry.
    pub initial_delay: f64,
    /// Multiplier applied to the delay after every attempt.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: f64, backoff_factor: f64) -> Self {
        Self {
            retries,
            initial_delay,
            backoff_factor,
        }
    }

    /// Compute `d + jitter` for a given backoff delay `d`.
    fn jittered(delay_secs: f64) -> Duration {
        let magnitude = 0.1 * delay_secs;
        let jitter = rand::thread_rng().gen_range(-magnitude..=magnitude);
        Duration::from_secs_f64((delay_secs + jitter).max(0.0))
    }

    /// Execute `op`, retrying on `Err` per the configured policy.
    ///
    /// `op` is a closure that produces a fresh future on every call (each
    /// attempt needs its own future, since futures can't be re-polled after
    /// they resolve). `cancel` is a watch channel that flips to `true` to
    /// request cancellation; it is checked before sleeping and interrupts an
    /// in-progress sleep immediately without waiting it out.
    pub async fn execute<F, Fut, T, E>(
        &self,
        cancel: &watch::Receiver<bool>,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.retries || *cancel.borrow() {
                        return Err(err);
                    }

                    let sleep_for = Self::jittered(delay);
                    let mut cancel = cancel.clone();
                    tokio::select! {
                        _ = tokio::time::sleep(sleep_for) => {}
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                return Err(err);
                            }
                        }
                    }

                    delay *= self.backoff_factor;
                    attempt += 1;
                }
            }
        }
    }
}
