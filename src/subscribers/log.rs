//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [added] listener=8080
//! [evicted] listener=onion-abc err="connection refused"
//! [retry] listener=8080 delay=100ms err="connection reset by peer"
//! [forward-timeout] listener=8080 peer=127.0.0.1:51034
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions for debugging and demonstration purposes; implement a
/// custom [`Subscribe`] for structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ListenerAdded => {
                if let Some(listener) = &e.listener {
                    println!("[added] listener={listener}");
                }
            }
            EventKind::ListenerRemoved => {
                println!("[removed] listener={:?}", e.listener);
            }
            EventKind::ListenerEvicted => {
                println!("[evicted] listener={:?} err={:?}", e.listener, e.error);
            }
            EventKind::ConnAccepted => {
                println!("[accepted] listener={:?} peer={:?}", e.listener, e.addr);
            }
            EventKind::AcceptRetryScheduled => {
                println!(
                    "[retry] listener={:?} delay={:?} err={:?}",
                    e.listener, e.delay, e.error
                );
            }
            EventKind::ForwardTimedOut => {
                println!("[forward-timeout] listener={:?} peer={:?}", e.listener, e.addr);
            }
            EventKind::WorkerPanicked => {
                println!("[worker-panic] listener={:?} err={:?}", e.listener, e.error);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[fan-out] err={:?}", e.error);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
