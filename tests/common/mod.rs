//! Shared test doubles: channel-backed mock endpoints, an idle endpoint
//! for hidden-service listeners, and a counting service factory.
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

use meta_listener::mirror::{AcmeBinder, HiddenService, HiddenServiceRef, ServiceFactory, TlsParams};
use meta_listener::{Connection, Endpoint, EndpointAddr, EndpointRef};

/// A listener whose connections are injected by the test.
///
/// `push` hands one end of a duplex pipe to the listener's accept queue
/// and returns the other end to the test. An error mode makes every accept
/// fail with the configured kind until cleared.
pub struct MockEndpoint {
    addr: EndpointAddr,
    conn_tx: mpsc::Sender<Connection>,
    conn_rx: Mutex<mpsc::Receiver<Connection>>,
    closed: CancellationToken,
    error_mode: StdMutex<Option<(io::ErrorKind, String)>>,
    error_changed: Notify,
}

impl MockEndpoint {
    pub fn new(addr: &str) -> Arc<Self> {
        let (conn_tx, conn_rx) = mpsc::channel(16);
        Arc::new(Self {
            addr: EndpointAddr::new("mock", addr),
            conn_tx,
            conn_rx: Mutex::new(conn_rx),
            closed: CancellationToken::new(),
            error_mode: StdMutex::new(None),
            error_changed: Notify::new(),
        })
    }

    /// Queues one incoming connection; returns the client half.
    pub async fn push(&self, peer: &str) -> DuplexStream {
        let (client, server) = tokio::io::duplex(64);
        let conn = Connection::new(
            Box::new(server),
            self.addr.clone(),
            EndpointAddr::new("mock", peer),
        );
        self.conn_tx.send(conn).await.expect("mock queue full");
        client
    }

    /// Makes every subsequent accept fail with `kind`.
    pub fn set_error(&self, kind: io::ErrorKind, msg: &str) {
        *self.error_mode.lock().unwrap() = Some((kind, msg.to_string()));
        self.error_changed.notify_waiters();
    }

    pub fn clear_error(&self) {
        *self.error_mode.lock().unwrap() = None;
        self.error_changed.notify_waiters();
    }

    fn current_error(&self) -> Option<io::Error> {
        self.error_mode
            .lock()
            .unwrap()
            .as_ref()
            .map(|(kind, msg)| io::Error::new(*kind, msg.clone()))
    }
}

#[async_trait]
impl Endpoint for MockEndpoint {
    async fn accept(&self) -> io::Result<Connection> {
        loop {
            if let Some(err) = self.current_error() {
                return Err(err);
            }
            tokio::select! {
                _ = self.closed.cancelled() => {
                    return Err(io::Error::other("listener closed"));
                }
                _ = self.error_changed.notified() => continue,
                conn = async {
                    let mut rx = self.conn_rx.lock().await;
                    rx.recv().await
                } => {
                    return conn.ok_or_else(|| io::Error::other("listener closed"));
                }
            }
        }
    }

    async fn close(&self) -> io::Result<()> {
        self.closed.cancel();
        Ok(())
    }

    fn addr(&self) -> EndpointAddr {
        self.addr.clone()
    }
}

/// An endpoint that never produces connections; accept blocks until close.
///
/// Stands in for onion/garlic listeners whose traffic is out of scope.
pub struct IdleEndpoint {
    addr: EndpointAddr,
    closed: CancellationToken,
}

impl IdleEndpoint {
    pub fn new(addr: EndpointAddr) -> Arc<Self> {
        Arc::new(Self {
            addr,
            closed: CancellationToken::new(),
        })
    }
}

#[async_trait]
impl Endpoint for IdleEndpoint {
    async fn accept(&self) -> io::Result<Connection> {
        self.closed.cancelled().await;
        Err(io::Error::other("listener closed"))
    }

    async fn close(&self) -> io::Result<()> {
        self.closed.cancel();
        Ok(())
    }

    fn addr(&self) -> EndpointAddr {
        self.addr.clone()
    }
}

/// Counters shared between a [`MockFactory`] and the services it mints.
#[derive(Default)]
pub struct FactoryStats {
    pub onions: AtomicUsize,
    pub garlics: AtomicUsize,
    pub plain_listens: AtomicUsize,
    pub tls_listens: AtomicUsize,
}

impl FactoryStats {
    pub fn onions(&self) -> usize {
        self.onions.load(Ordering::SeqCst)
    }

    pub fn garlics(&self) -> usize {
        self.garlics.load(Ordering::SeqCst)
    }

    pub fn plain_listens(&self) -> usize {
        self.plain_listens.load(Ordering::SeqCst)
    }

    pub fn tls_listens(&self) -> usize {
        self.tls_listens.load(Ordering::SeqCst)
    }
}

/// Factory minting idle hidden services, with an optional creation delay
/// to widen race windows in concurrency tests.
pub struct MockFactory {
    pub stats: Arc<FactoryStats>,
    pub delay: Duration,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(FactoryStats::default()),
            delay,
        })
    }
}

#[async_trait]
impl ServiceFactory for MockFactory {
    async fn onion(&self, label: &str) -> io::Result<HiddenServiceRef> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.stats.onions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockHiddenService {
            addr: EndpointAddr::onion(format!("{label}.onion:443")),
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn garlic(
        &self,
        label: &str,
        _control: &str,
        _wide: bool,
    ) -> io::Result<HiddenServiceRef> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.stats.garlics.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockHiddenService {
            addr: EndpointAddr::garlic(format!("{label}.b32.i2p:443")),
            stats: Arc::clone(&self.stats),
        }))
    }
}

pub struct MockHiddenService {
    addr: EndpointAddr,
    stats: Arc<FactoryStats>,
}

#[async_trait]
impl HiddenService for MockHiddenService {
    async fn listen(&self) -> io::Result<EndpointRef> {
        self.stats.plain_listens.fetch_add(1, Ordering::SeqCst);
        let listener: EndpointRef = IdleEndpoint::new(self.addr.clone());
        Ok(listener)
    }

    async fn listen_tls(&self) -> io::Result<EndpointRef> {
        self.stats.tls_listens.fetch_add(1, Ordering::SeqCst);
        let listener: EndpointRef = IdleEndpoint::new(self.addr.clone());
        Ok(listener)
    }

    async fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// ACME binder that records the parameters it was handed.
#[derive(Default)]
pub struct MockAcme {
    pub bound: StdMutex<Vec<TlsParams>>,
}

impl MockAcme {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl AcmeBinder for MockAcme {
    async fn bind(&self, params: TlsParams) -> io::Result<EndpointRef> {
        let addr = EndpointAddr::new("tls", format!("{}:443", params.domain));
        self.bound.lock().unwrap().push(params);
        let listener: EndpointRef = IdleEndpoint::new(addr);
        Ok(listener)
    }
}
