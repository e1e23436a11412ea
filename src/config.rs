//! # Meta listener configuration.
//!
//! [`Config`] defines the supervisor's behavior: fan-in channel capacity,
//! removal channel capacity, event channel capacity, shutdown grace
//! window, forward timeout, and the backoff policy for transient accept
//! errors.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use meta_listener::{BackoffPolicy, Config};
//!
//! let mut cfg = Config::default();
//! cfg.grace = Duration::from_millis(250);
//! cfg.retry = BackoffPolicy::default();
//!
//! assert_eq!(cfg.conn_capacity, 100);
//! ```

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Configuration for a [`MetaListener`](crate::MetaListener).
///
/// Controls channel sizing, the shutdown grace window, how long a worker may
/// block handing a connection to a stalled consumer, and transient-error
/// retry behavior.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the fan-in connection channel.
    ///
    /// Sized so a brief consumer stall does not immediately block workers;
    /// the forward timeout bounds the tail.
    pub conn_capacity: usize,
    /// Capacity of the worker-to-supervisor removal channel.
    pub removal_capacity: usize,
    /// Capacity of the broadcast event channel.
    ///
    /// Also the buffering each attached subscriber gets; one that falls
    /// further behind skips ahead and is handed an overflow diagnostic.
    pub events_capacity: usize,
    /// Grace window after close during which workers are expected to
    /// observe shutdown and exit voluntarily.
    pub grace: Duration,
    /// Maximum time a worker may spend offering one connection to the
    /// fan-in channel before dropping it.
    pub forward_timeout: Duration,
    /// Backoff policy applied between retries of transient accept errors.
    pub retry: BackoffPolicy,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `conn_capacity = 100`
    /// - `removal_capacity = 10`
    /// - `events_capacity = 1024`
    /// - `grace = 100ms`
    /// - `forward_timeout = 5s`
    /// - `retry = BackoffPolicy::default()` (constant 100ms)
    fn default() -> Self {
        Self {
            conn_capacity: 100,
            removal_capacity: 10,
            events_capacity: 1024,
            grace: Duration::from_millis(100),
            forward_timeout: Duration::from_secs(5),
            retry: BackoffPolicy::default(),
        }
    }
}
