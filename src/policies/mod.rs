//! Retry policies for transient accept failures.
//!
//! - [`BackoffPolicy`] how retry delays grow between consecutive transient
//!   accept errors on one source listener.
//! - [`JitterPolicy`] optional randomization of those delays.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
