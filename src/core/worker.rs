//! # Per-source worker: one accept loop per managed listener.
//!
//! Each registered listener gets exactly one [`Worker`] that owns its
//! accept loop:
//!
//! ```text
//! loop {
//!   ├─► check shutdown (fast-path)
//!   ├─► accept, raced against the shutdown signal
//!   ├─► classify errors:
//!   │     ├─► Timeout    → retry immediately
//!   │     ├─► Transient  → backoff (cancellable), retry
//!   │     └─► Fatal      → shutdown observed? exit silently
//!   │                      otherwise request self-removal, exit
//!   └─► forward into the fan-in channel (three-way select):
//!         ├─► sent                → publish ConnAccepted, loop
//!         ├─► shutdown signalled  → drop the connection, exit
//!         └─► forward timeout     → drop the connection, keep accepting
//! }
//! ```
//!
//! ## Rules
//! - The worker never touches the registry; self-removal goes through the
//!   removal channel so the supervisor deletes the entry under its own lock.
//! - A dropped connection closes its socket; dropping is the correct
//!   response to a stalled consumer because the alternative is unbounded
//!   accept-queue growth in the kernel.
//! - The loop runs under `catch_unwind`: a panicking transport publishes
//!   `WorkerPanicked` and releases its tracker slot instead of leaking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Connection, Endpoint, EndpointRef};
use crate::error::AcceptClass;
use crate::events::{panic_message, Event, EventKind};
use crate::policies::BackoffPolicy;

/// Accept loop state for one source listener.
pub(crate) struct Worker {
    pub(crate) id: String,
    pub(crate) endpoint: EndpointRef,
    pub(crate) conn_tx: mpsc::Sender<Connection>,
    pub(crate) removal_tx: mpsc::Sender<String>,
    pub(crate) events: broadcast::Sender<Event>,
    pub(crate) retry: BackoffPolicy,
    pub(crate) forward_timeout: Duration,
    pub(crate) closed: Arc<AtomicBool>,
}

impl Worker {
    /// Runs the accept loop until shutdown or a fatal accept error.
    pub(crate) async fn run(self, shutdown: CancellationToken) {
        let id = self.id.clone();
        let events = self.events.clone();

        let loop_fut = std::panic::AssertUnwindSafe(self.accept_loop(shutdown)).catch_unwind();
        if let Err(panic_err) = loop_fut.await {
            let _ = events.send(
                Event::now(EventKind::WorkerPanicked)
                    .with_listener(&id)
                    .with_error(panic_message(&*panic_err)),
            );
        }
    }

    async fn accept_loop(self, shutdown: CancellationToken) {
        let mut prev_delay: Option<Duration> = None;

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            let res = select! {
                _ = shutdown.cancelled() => return,
                res = self.endpoint.accept() => res,
            };

            let mut conn = match res {
                Ok(conn) => conn,
                Err(err) => match AcceptClass::of(&err) {
                    AcceptClass::Timeout => continue,
                    AcceptClass::Transient => {
                        let delay = self.retry.next(prev_delay);
                        prev_delay = Some(delay);
                        let _ = self.events.send(
                            Event::now(EventKind::AcceptRetryScheduled)
                                .with_listener(&self.id)
                                .with_delay(delay)
                                .with_error(err.to_string()),
                        );
                        select! {
                            _ = time::sleep(delay) => continue,
                            _ = shutdown.cancelled() => return,
                        }
                    }
                    AcceptClass::Fatal => {
                        // During shutdown the listener's own close produced
                        // this error; nothing to remove.
                        if self.closed.load(Ordering::SeqCst) {
                            return;
                        }
                        self.request_removal(&shutdown).await;
                        return;
                    }
                },
            };

            prev_delay = None;
            conn.set_source(&self.id);
            if !self.forward(conn, &shutdown).await {
                return;
            }
        }
    }

    /// Publishes this worker's id on the removal path.
    ///
    /// Falls back to the shutdown signal so a full removal channel during
    /// teardown cannot wedge the worker.
    async fn request_removal(&self, shutdown: &CancellationToken) {
        select! {
            res = self.removal_tx.send(self.id.clone()) => { let _ = res; }
            _ = shutdown.cancelled() => {}
        }
    }

    /// Offers one connection to the fan-in channel.
    ///
    /// Returns `false` when the worker should exit. The timeout and
    /// shutdown branches drop the in-flight send future, which closes the
    /// connection.
    async fn forward(&self, conn: Connection, shutdown: &CancellationToken) -> bool {
        let peer = conn.peer_addr().to_string();
        let send = self.conn_tx.send(conn);
        tokio::pin!(send);

        select! {
            res = &mut send => match res {
                Ok(()) => {
                    let _ = self.events.send(
                        Event::now(EventKind::ConnAccepted)
                            .with_listener(&self.id)
                            .with_addr(peer),
                    );
                    true
                }
                // The fan-in channel only closes when the supervisor is gone.
                Err(_) => false,
            },
            _ = shutdown.cancelled() => false,
            _ = time::sleep(self.forward_timeout) => {
                let _ = self.events.send(
                    Event::now(EventKind::ForwardTimedOut)
                        .with_listener(&self.id)
                        .with_addr(peer),
                );
                true
            }
        }
    }
}
