//! # Inner-listener contract.
//!
//! [`Endpoint`] is the seam between the meta listener and the transports it
//! aggregates: plain TCP, TLS, Unix sockets, or anonymity-network virtual
//! listeners. The supervisor owns an endpoint from registration until
//! removal or shutdown and drives it from exactly one worker task.
//!
//! ## Rules
//! - `accept` must be cancel-safe: the worker races it against the shutdown
//!   signal, and a dropped accept future must not lose listener state.
//! - `close` must unblock any in-flight `accept`, which thereafter returns
//!   an error classified as fatal. Transports without native close
//!   semantics typically keep an internal cancellation token for this.
//! - Errors that the transport knows to be temporary should surface as
//!   `WouldBlock`/`Interrupted` so the worker backs off instead of evicting
//!   the listener.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;

use super::addr::EndpointAddr;
use super::conn::Connection;

/// Shared handle to a managed listener.
///
/// The registry stores one per entry; its worker holds a clone so either
/// side can close without waiting on the other.
pub type EndpointRef = Arc<dyn Endpoint>;

/// An accept-capable transport listener.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Waits for and returns the next incoming connection.
    async fn accept(&self) -> io::Result<Connection>;

    /// Closes the listener and unblocks pending accepts.
    async fn close(&self) -> io::Result<()>;

    /// Returns the listener's address.
    fn addr(&self) -> EndpointAddr;
}
