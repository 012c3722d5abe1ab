//! Reconnect delay computation.
//!
//! The delay doubles with every consecutive failed attempt, is capped at
//! `max_interval`, and is spread by a symmetric jitter so that many clients
//! dropped by the same outage do not reconnect in lockstep.

use rand::Rng;
use std::time::Duration;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(3);
pub const MAX_RECONNECT_INTERVAL: Duration = Duration::from_secs(60);
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Attempt numbers above this stop growing the exponent.
pub const MAX_BACKOFF_ATTEMPT: u32 = 30;
pub const JITTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectBackoff {
    pub base_interval: Duration,
    pub max_interval: Duration,
    pub jitter_ratio: f64,
    pub floor: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::with_base(DEFAULT_RECONNECT_INTERVAL)
    }
}

impl ReconnectBackoff {
    pub fn with_base(base_interval: Duration) -> Self {
        Self {
            base_interval,
            max_interval: MAX_RECONNECT_INTERVAL,
            jitter_ratio: JITTER_RATIO,
            floor: MIN_RECONNECT_DELAY,
        }
    }

    /// `min(max_interval, base_interval * 2^(attempt - 1))`, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.clamp(1, MAX_BACKOFF_ATTEMPT) - 1;
        self.base_interval
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    pub fn jittered_delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt).as_secs_f64();
        let spread = base * self.jitter_ratio;
        let jittered = if spread > 0.0 {
            base + rng.gen_range(-spread..=spread)
        } else {
            base
        };
        Duration::from_secs_f64(jittered.max(0.0)).max(self.floor)
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.jittered_delay(attempt, &mut rand::thread_rng())
    }
}
