//! # Events emitted by the meta listener.
//!
//! The meta listener narrates its lifecycle (registrations, removals,
//! self-evictions, accept retries, shutdown progress) as [`Event`]s sent
//! over a bounded [`tokio::sync::broadcast`] channel. Publishing is
//! fire-and-forget: with no receivers the send fails and the event is
//! dropped, and nothing in the listener's correctness depends on anyone
//! consuming the stream. Tap the channel with
//! [`MetaListener::events`](crate::MetaListener::events) or attach
//! [`Subscribe`](crate::Subscribe) implementations at construction.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Registry events**: listeners entering and leaving the aggregate.
//! - **Worker events**: per-source accept loop activity and faults.
//! - **Shutdown events**: close and drain progress.
//! - **Subscriber events**: diagnostics of the event delivery itself.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so events can be ordered correctly even when delivered
//! out-of-order through async channels.
//!
//! ## Example
//! ```rust
//! use meta_listener::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::ListenerEvicted)
//!     .with_listener("onion-abc")
//!     .with_error("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::ListenerEvicted);
//! assert_eq!(ev.listener.as_deref(), Some("onion-abc"));
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of meta listener events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// A listener was registered and its worker spawned.
    ListenerAdded,
    /// A listener was explicitly unregistered.
    ListenerRemoved,
    /// A listener removed itself after a permanent accept error.
    ListenerEvicted,

    // === Worker events ===
    /// A connection was accepted and forwarded into the aggregate.
    ConnAccepted,
    /// A transient accept error scheduled a backoff before retrying.
    AcceptRetryScheduled,
    /// A connection could not be handed to the consumer in time and was
    /// dropped.
    ForwardTimedOut,
    /// A worker panicked; the source listener is abandoned.
    WorkerPanicked,

    // === Shutdown events ===
    /// Close was invoked; the shutdown signal has been broadcast.
    ShutdownRequested,
    /// All workers exited within the configured grace window.
    AllStoppedWithin,
    /// The grace window expired; close keeps waiting for stragglers.
    GraceExceeded,

    // === Subscriber events ===
    /// A subscriber fell behind its tap and missed events.
    SubscriberOverflow,
    /// A subscriber panicked while handling an event.
    SubscriberPanicked,
}

/// Meta listener event with optional metadata.
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Id of the listener involved, if applicable.
    pub listener: Option<String>,
    /// Address involved (peer or member), if applicable.
    pub addr: Option<String>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// Backoff delay before the next accept retry, if relevant.
    pub delay: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            listener: None,
            addr: None,
            error: None,
            delay: None,
        }
    }

    /// Attaches a listener id.
    pub fn with_listener(mut self, id: impl Into<String>) -> Self {
        self.listener = Some(id.into());
        self
    }

    /// Attaches an address.
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches a backoff delay.
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Creates the overflow diagnostic a lagging subscriber receives in
    /// place of the events it missed.
    pub fn subscriber_overflow(subscriber: &'static str, missed: u64) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_listener(subscriber)
            .with_error(format!("missed {missed} events"))
    }

    /// Creates the panic diagnostic a subscriber receives after its own
    /// handler panicked.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_listener(subscriber)
            .with_error(info)
    }
}

/// Renders a caught panic payload for an event's error field.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
