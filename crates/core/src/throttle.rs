//! Request pacing for uploads

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between two uploads
pub const DEFAULT_UPLOAD_INTERVAL: Duration = Duration::from_millis(500);

/// Hands out permits at a bounded rate
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until the caller may issue its next request
    async fn acquire(&self);
}

/// Leaky bucket releasing one permit per `interval`.
///
/// The first permit is granted immediately. Later permits are spaced at least
/// `interval` apart, also across concurrent callers; an idle bucket does not
/// accumulate a burst.
#[derive(Debug)]
pub struct LeakyBucket {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl LeakyBucket {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A bucket that never waits
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for LeakyBucket {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_INTERVAL)
    }
}

#[async_trait]
impl RateLimiter for LeakyBucket {
    async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        if slot > Instant::now() {
            tokio::time::sleep_until(slot).await;
        }
    }
}
