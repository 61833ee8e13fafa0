//! Minimum-interval rate limiting for outbound requests.
//!
//! The limiter spaces out the *start* of successive requests. The slot is
//! reserved under a mutex, then the caller waits for it on the tokio timer
//! without holding the lock, so concurrent callers queue up in reservation
//! order instead of observing a stale timestamp.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Interval the becas service asks clients to respect (two requests per second)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Enforces a minimum spacing between request starts
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    previous_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            previous_start: Mutex::new(None),
        }
    }

    /// Minimum interval between request starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may start.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let (slot, wait) = {
            let mut previous = self.previous_start.lock().await;
            let now = Instant::now();
            let slot = match *previous {
                Some(prev) if prev + self.interval > now => prev + self.interval,
                _ => now,
            };
            *previous = Some(slot);
            (slot, slot - now)
        };

        if !wait.is_zero() {
            tracing::debug!("Rate limiting: waiting {:?} before next request", wait);
            sleep_until(slot).await;
        }
        wait
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
