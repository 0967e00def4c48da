//! Global rate limiter (C2).
//!
//! Enforces a minimum wall-clock interval between the *starts* of any two
//! protected calls, not merely an average rate. A single `last_start`
//! timestamp is guarded by a mutex that is held across the wait itself: the
//! next caller computes how long it must still wait, sleeps while holding
//! the lock, then stamps `last_start` and releases. This strict serialization
//! is deliberate — see the module-level rationale in the design spec.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    min_interval: Option<Duration>,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// `requests_per_minute <= 0` disables the limiter (`wait` becomes a no-op).
    pub fn new(requests_per_minute: i64) -> Self {
        let min_interval = if requests_per_minute > 0 {
            Some(Duration::from_secs_f64(60.0 / requests_per_minute as f64))
        } else {
            None
        };

        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Block until it is this caller's turn to start, then record the start.
    pub async fn wait(&self) {
        let Some(min_interval) = self.min_interval else {
            return;
        };

        let mut last_start = self.last_start.lock().await;

        let now = Instant::now();
        if let Some(prev) = *last_start {
            let earliest_allowed = prev + min_interval;
            if earliest_allowed > now {
                tokio::time::sleep_until(earliest_allowed).await;
            }
        }

        *last_start = Some(Instant::now());
    }
}
