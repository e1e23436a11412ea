//! # MetaListener: the supervisor and public accept façade.
//!
//! [`MetaListener`] owns the registry of managed listeners and everything
//! that coordinates them: the fan-in channel, the shutdown signal, the
//! removal path, the worker group, and the event channel.
//!
//! - Register/unregister listeners under unique ids
//! - Serve the next connection from any source via [`MetaListener::accept`]
//! - Evict sources that fail permanently, without disturbing the rest
//! - Drive idempotent shutdown with a bounded grace window
//!
//! ## Shutdown timeline
//! ```text
//! close()
//!   ├─► CAS closed flag (second close returns Ok immediately)
//!   ├─► under the registry lock:
//!   │     ├─► publish ShutdownRequested, cancel the shutdown token
//!   │     │     (first, so workers blocked in the forward select wake
//!   │     │      before any inner close can stall teardown)
//!   │     └─► close every entry, collecting errors; clear the registry
//!   ├─► grace window: wait for the worker group, bounded by Config::grace
//!   │     └─► on expiry: publish GraceExceeded, keep waiting unconditionally
//!   └─► return the aggregated inner-close errors, or Ok
//! ```
//!
//! ## Rules
//! - The registry lock is held briefly: registration, unregistration, the
//!   close walk. Workers never take it; their removal requests are applied
//!   by a background loop owned by the supervisor.
//! - Workers are tracked **before** their task starts, so a drain wait
//!   that begins immediately after `register` returns still sees them.
//! - Connections from one source arrive in that source's accept order;
//!   interleaving across sources is whatever the fan-in channel saw.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::core::worker::Worker;
use crate::endpoint::{Connection, Endpoint, EndpointRef, MetaAddr};
use crate::error::MetaError;
use crate::events::{Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

type Registry = Arc<RwLock<HashMap<String, EndpointRef>>>;

/// Multiplexed listener: many transport listeners behind one accept surface.
pub struct MetaListener {
    cfg: Config,
    events: broadcast::Sender<Event>,
    entries: Registry,
    conn_tx: mpsc::Sender<Connection>,
    conn_rx: Mutex<mpsc::Receiver<Connection>>,
    removal_tx: mpsc::Sender<String>,
    shutdown: CancellationToken,
    closed: Arc<AtomicBool>,
    draining: AtomicBool,
    workers: TaskTracker,
}

impl std::fmt::Debug for MetaListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaListener").finish_non_exhaustive()
    }
}

impl MetaListener {
    /// Creates an empty meta listener and starts its background loops.
    ///
    /// Must be called from within a tokio runtime. Each subscriber is
    /// driven by its own delivery worker off the event channel; pass an
    /// empty vec to run without observers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let (events, _) = broadcast::channel(cfg.events_capacity);
        let (conn_tx, conn_rx) = mpsc::channel(cfg.conn_capacity);
        let (removal_tx, removal_rx) = mpsc::channel(cfg.removal_capacity);
        let entries: Registry = Arc::new(RwLock::new(HashMap::new()));
        let shutdown = CancellationToken::new();

        if !subscribers.is_empty() {
            // Workers detach and exit once the event channel closes.
            SubscriberSet::attach(subscribers, &events);
        }
        Self::spawn_removal_loop(
            Arc::clone(&entries),
            removal_rx,
            events.clone(),
            shutdown.clone(),
        );

        Self {
            cfg,
            events,
            entries,
            conn_tx,
            conn_rx: Mutex::new(conn_rx),
            removal_tx,
            shutdown,
            closed: Arc::new(AtomicBool::new(false)),
            draining: AtomicBool::new(false),
            workers: TaskTracker::new(),
        }
    }

    /// Creates a meta listener with the default configuration and no
    /// subscribers.
    pub fn with_defaults() -> Self {
        Self::new(Config::default(), Vec::new())
    }

    /// Registers `endpoint` under `id` and spawns its worker.
    ///
    /// Fails with [`MetaError::Closed`] after shutdown,
    /// [`MetaError::ShuttingDown`] once a drain wait has begun, and
    /// [`MetaError::DuplicateId`] when the id is taken.
    pub async fn register(
        &self,
        id: impl Into<String>,
        endpoint: EndpointRef,
    ) -> Result<(), MetaError> {
        let id = id.into();
        if self.closed.load(Ordering::SeqCst) {
            return Err(MetaError::Closed);
        }
        if self.draining.load(Ordering::SeqCst) {
            return Err(MetaError::ShuttingDown);
        }

        let mut entries = self.entries.write().await;
        // Close may have won the lock in between; re-check under it.
        if self.closed.load(Ordering::SeqCst) {
            return Err(MetaError::Closed);
        }
        if entries.contains_key(&id) {
            return Err(MetaError::DuplicateId { id });
        }
        entries.insert(id.clone(), Arc::clone(&endpoint));

        let worker = Worker {
            id: id.clone(),
            endpoint,
            conn_tx: self.conn_tx.clone(),
            removal_tx: self.removal_tx.clone(),
            events: self.events.clone(),
            retry: self.cfg.retry,
            forward_timeout: self.cfg.forward_timeout,
            closed: Arc::clone(&self.closed),
        };
        // Tracked synchronously, before the task runs, so a drain wait
        // started right after this call cannot miss the worker.
        self.workers.spawn(worker.run(self.shutdown.clone()));
        drop(entries);

        let _ = self
            .events
            .send(Event::now(EventKind::ListenerAdded).with_listener(&id));
        Ok(())
    }

    /// Closes and removes the listener registered under `id`.
    ///
    /// Does not wait for the worker; it exits on its own once it observes
    /// the listener's close error.
    pub async fn unregister(&self, id: &str) -> Result<(), MetaError> {
        let mut entries = self.entries.write().await;
        let endpoint = entries.remove(id).ok_or_else(|| MetaError::NotFound {
            id: id.to_string(),
        })?;
        let res = endpoint.close().await;
        drop(entries);

        let _ = self
            .events
            .send(Event::now(EventKind::ListenerRemoved).with_listener(id));
        res.map_err(|source| MetaError::CloseEndpoint {
            id: id.to_string(),
            source,
        })
    }

    /// Returns a snapshot of the current listener ids; order unspecified.
    pub async fn ids(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Returns the number of managed listeners.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns the listener count, or [`MetaError::NoListeners`] when the
    /// aggregate is empty.
    ///
    /// Purely informational: [`MetaListener::accept`] never synthesizes
    /// this error and simply blocks on an empty aggregate.
    pub async fn require_active(&self) -> Result<usize, MetaError> {
        match self.count().await {
            0 => Err(MetaError::NoListeners),
            n => Ok(n),
        }
    }

    /// Returns the composite address of all managed listeners.
    pub async fn addr(&self) -> MetaAddr {
        let entries = self.entries.read().await;
        MetaAddr::new(entries.values().map(|e| e.addr()).collect())
    }

    /// Taps the raw event stream.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Returns the next connection arriving on any managed listener.
    ///
    /// Blocks while the aggregate is empty or idle; returns
    /// [`MetaError::Closed`] once the meta listener has been closed.
    /// Concurrent callers are served first-come-first-served.
    pub async fn accept(&self) -> Result<Connection, MetaError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MetaError::Closed);
        }

        let mut rx = self.conn_rx.lock().await;
        loop {
            tokio::select! {
                conn = rx.recv() => return conn.ok_or(MetaError::Closed),
                _ = self.shutdown.cancelled() => {
                    if self.closed.load(Ordering::SeqCst) {
                        return Err(MetaError::Closed);
                    }
                    // The flag is set before the signal is raised; this
                    // branch exists only for pathological orderings.
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    /// Closes the meta listener: every managed listener is closed, workers
    /// are drained, and subsequent accepts fail.
    ///
    /// Idempotent; a second call returns `Ok(())` immediately. Inner close
    /// failures are collected into one [`MetaError::Close`].
    pub async fn close(&self) -> Result<(), MetaError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let errors = {
            let mut entries = self.entries.write().await;
            // Signal first: workers stuck in the forward select must wake
            // before an inner close that blocks on internal teardown.
            let _ = self.events.send(Event::now(EventKind::ShutdownRequested));
            self.shutdown.cancel();

            let mut errors = Vec::new();
            for (id, endpoint) in entries.drain() {
                if let Err(err) = endpoint.close().await {
                    errors.push(format!("{id}: {err}"));
                }
            }
            errors
        };

        self.workers.close();
        match time::timeout(self.cfg.grace, self.workers.wait()).await {
            Ok(()) => {
                let _ = self.events.send(Event::now(EventKind::AllStoppedWithin));
            }
            Err(_) => {
                let _ = self.events.send(Event::now(EventKind::GraceExceeded));
                // No hard kill: workers are cooperatively bounded by their
                // shutdown probes, so this wait is finite.
                self.workers.wait().await;
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MetaError::Close { errors })
        }
    }

    /// Blocks until every worker has exited, or `deadline` elapses.
    ///
    /// Sets the shutting-down flag first: from this point on registrations
    /// are rejected even though the meta listener is not yet closed. On
    /// expiry returns [`MetaError::DrainDeadline`] without terminating
    /// workers.
    pub async fn wait_for_drain(&self, deadline: Duration) -> Result<(), MetaError> {
        self.draining.store(true, Ordering::SeqCst);
        self.workers.close();
        time::timeout(deadline, self.workers.wait())
            .await
            .map_err(|_| MetaError::DrainDeadline { deadline })
    }

    /// Applies worker self-removal requests.
    ///
    /// A worker cannot close its own listener while other paths hold the
    /// registry lock, so eviction is funneled through this loop: delete
    /// the entry under the lock, close the endpoint, publish the event.
    /// Ids no longer present are ignored (duplicate removals are no-ops).
    fn spawn_removal_loop(
        entries: Registry,
        mut removal_rx: mpsc::Receiver<String>,
        events: broadcast::Sender<Event>,
        shutdown: CancellationToken,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    id = removal_rx.recv() => match id {
                        Some(id) => {
                            let removed = entries.write().await.remove(&id);
                            if let Some(endpoint) = removed {
                                let _ = endpoint.close().await;
                                let _ = events.send(
                                    Event::now(EventKind::ListenerEvicted).with_listener(&id),
                                );
                            }
                        }
                        None => break,
                    },
                }
            }
        });
    }
}
