//! # Per-subscriber delivery workers.
//!
//! [`SubscriberSet::attach`] gives every subscriber its own tap on the
//! bounded event channel and a dedicated worker task that drains it:
//!
//! ```text
//! event channel (broadcast)
//!     ├──► tap 1 ──► worker 1 ──► subscriber1.on_event()
//!     ├──► tap 2 ──► worker 2 ──► subscriber2.on_event()
//!     └──► tap N ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - Per-subscriber delivery is FIFO; there is no cross-subscriber
//!   ordering. Publishers are never blocked by a slow subscriber.
//! - Buffering comes from the channel capacity
//!   ([`Config::events_capacity`](crate::Config::events_capacity)). A
//!   subscriber that falls behind it skips the missed events and receives
//!   a single `SubscriberOverflow` in their place.
//! - Panics are contained to the panicking subscriber. The worker reports
//!   them back to that subscriber alone as `SubscriberPanicked`; other
//!   subscribers and the listener itself are unaffected.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::events::{panic_message, Event};
use crate::subscribers::Subscribe;

/// Handle over the delivery workers of a set of subscribers.
pub struct SubscriberSet {
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Spawns one delivery worker per subscriber.
    ///
    /// Each worker runs until the event channel closes, which happens when
    /// the last sender (the meta listener) is dropped.
    pub fn attach(subs: Vec<Arc<dyn Subscribe>>, events: &broadcast::Sender<Event>) -> Self {
        let workers = subs
            .into_iter()
            .map(|sub| {
                let mut tap = events.subscribe();
                tokio::spawn(async move {
                    loop {
                        match tap.recv().await {
                            Ok(ev) => deliver(sub.as_ref(), &ev).await,
                            Err(RecvError::Lagged(missed)) => {
                                let note = Event::subscriber_overflow(sub.name(), missed);
                                deliver(sub.as_ref(), &note).await;
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                })
            })
            .collect();

        Self { workers }
    }

    /// Waits for every delivery worker to finish.
    ///
    /// Completes once the event channel has closed and each worker has
    /// drained its tap.
    pub async fn join(self) {
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Hands one event to a subscriber, containing panics.
///
/// The panic diagnostic goes back to the panicking subscriber only;
/// pushing it onto the shared channel would loop forever for a subscriber
/// that panics on every event.
async fn deliver(sub: &dyn Subscribe, ev: &Event) {
    let handled = std::panic::AssertUnwindSafe(sub.on_event(ev)).catch_unwind();
    if let Err(panic_err) = handled.await {
        let note = Event::subscriber_panicked(sub.name(), panic_message(&*panic_err));
        let _ = std::panic::AssertUnwindSafe(sub.on_event(&note))
            .catch_unwind()
            .await;
    }
}
