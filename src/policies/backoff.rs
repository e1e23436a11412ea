//! # Backoff policy for transient accept errors.
//!
//! [`BackoffPolicy`] controls how the per-source worker delays between
//! retries after consecutive transient accept failures. It is parameterized
//! by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The worker resets the sequence after every successful accept, so the
//! delay only grows while a source fails back-to-back.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use meta_listener::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(5),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(None), Duration::from_millis(100));
//! assert_eq!(backoff.next(Some(Duration::from_millis(100))), Duration::from_millis(200));
//! // Capped at max once the doubling overshoots.
//! assert_eq!(backoff.next(Some(Duration::from_secs(20))), Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy for a source listener's accept loop.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to spread out synchronized retries.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 100ms`;
    /// - `factor = 1.0` (constant delay);
    /// - `max = 30s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the next delay based on the previous one.
    ///
    /// - If `prev` is `None`, returns `first` clamped to `max`.
    /// - Otherwise multiplies the previous delay by [`BackoffPolicy::factor`]
    ///   and caps it at [`BackoffPolicy::max`].
    pub fn next(&self, prev: Option<Duration>) -> Duration {
        let unclamped = match prev {
            None => self.first,
            Some(d) => {
                let mul = d.as_secs_f64() * self.factor;
                if !mul.is_finite() {
                    self.max
                } else {
                    d.mul_f64(self.factor)
                }
            }
        };

        let base = if unclamped > self.max {
            self.max
        } else {
            unclamped
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_constant_hundred_millis() {
        let p = BackoffPolicy::default();
        let first = p.next(None);
        assert_eq!(first, Duration::from_millis(100));
        assert_eq!(p.next(Some(first)), Duration::from_millis(100));
    }

    #[test]
    fn growth_is_capped_at_max() {
        let p = BackoffPolicy {
            first: Duration::from_millis(50),
            max: Duration::from_millis(400),
            factor: 4.0,
            jitter: JitterPolicy::None,
        };
        let mut prev = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            let d = p.next(prev);
            seen.push(d);
            prev = Some(d);
        }
        assert_eq!(
            seen,
            vec![
                Duration::from_millis(50),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(400),
            ]
        );
    }
}
