//! # Retry delay schedule.
//!
//! The delay before retry `n` (0-indexed) is `first × factor^n`, capped at `max`,
//! then randomized by the [`JitterPolicy`]. The base is recomputed from `n` every
//! time, so a short jittered delay never shrinks the following ones.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 4.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(400));
//! assert_eq!(backoff.next(2), Duration::from_secs(1));
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of the base delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact base delay.
    #[default]
    None,
    /// Uniform in `[0, base]`.
    Full,
    /// `base/2` plus uniform in `[0, base/2]`.
    Equal,
    /// Uniform in `[first, base × 3]`, capped at `max`.
    Decorrelated,
}

impl JitterPolicy {
    /// Randomizes `base`. `floor` and `cap` only matter for [`JitterPolicy::Decorrelated`].
    pub fn apply(self, base: Duration, floor: Duration, cap: Duration) -> Duration {
        let ms = as_millis(base);
        let mut rng = rand::rng();
        let jittered = match self {
            JitterPolicy::None => return base,
            JitterPolicy::Full => rng.random_range(0..=ms),
            JitterPolicy::Equal => {
                let half = ms / 2;
                half + rng.random_range(0..=ms - half)
            }
            JitterPolicy::Decorrelated => {
                let lo = as_millis(floor);
                let hi = ms.saturating_mul(3).min(as_millis(cap)).max(lo);
                rng.random_range(lo..=hi)
            }
        };
        Duration::from_millis(jittered)
    }
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Delay schedule between retries.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth factor per retry.
    pub factor: f64,
    /// Randomization of each delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 4.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay of `delay` between retries.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay before retry `attempt` (0-indexed).
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = if secs.is_finite() && (0.0..=self.max.as_secs_f64()).contains(&secs) {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };
        self.jitter.apply(base, self.first.min(self.max), self.max)
    }
}
