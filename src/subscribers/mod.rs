//! Event subscribers and the per-subscriber delivery workers.
//!
//! - [`Subscribe`] the extension point for custom event handlers.
//! - [`SubscriberSet`] one event-channel tap and worker per subscriber,
//!   with lag reporting and panic isolation.
//! - [`LogWriter`] a stdout reference subscriber (feature `logging`).

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
