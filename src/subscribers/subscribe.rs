//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers
//! into the meta listener: metrics, audit trails, structured logging.
//! Handlers are driven from a dedicated worker per subscriber, so a slow
//! implementation delays only its own delivery, never the listener or
//! other subscribers. A handler that cannot keep up with the event
//! channel's capacity skips ahead and is handed a `SubscriberOverflow`
//! for the gap.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative
/// waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
