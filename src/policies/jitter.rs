//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that many source
//! listeners failing at once do not retry in lockstep.
//!
//! - [`JitterPolicy::None`] no randomization, predictable delays
//! - [`JitterPolicy::Full`] random delay in [0, backoff_delay]
//! - [`JitterPolicy::Equal`] delay = backoff_delay/2 + random[0, backoff_delay/2]

use std::time::Duration;

use rand::Rng;

/// Policy controlling randomization of retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    #[default]
    None,

    /// Full jitter: random delay in [0, backoff_delay].
    ///
    /// Most aggressive spreading; can significantly shorten the delay.
    Full,

    /// Equal jitter: delay/2 + random[0, delay/2].
    ///
    /// Preserves about 75% of the original backoff on average.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

/// Full jitter: random in [0, delay].
fn full_jitter(delay: Duration) -> Duration {
    let ms = (delay.as_millis().min(u128::from(u64::MAX))) as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(0..=ms))
}

/// Equal jitter: delay/2 + random[0, delay/2].
fn equal_jitter(delay: Duration) -> Duration {
    let ms = (delay.as_millis().min(u128::from(u64::MAX))) as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let mut rng = rand::rng();
    let jitter = if half == 0 {
        0
    } else {
        rng.random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}
