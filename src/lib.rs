//! # meta-listener
//!
//! **meta-listener** multiplexes an arbitrary set of transport listeners
//! (plain TCP, TLS, Unix sockets, Tor onion services, I2P garlic services)
//! behind a single connection-oriented accept surface.
//!
//! Register N listeners under unique ids; one [`MetaListener::accept`]
//! call thereafter returns the next connection arriving on any of them.
//! Listeners that fail permanently remove themselves without disturbing
//! the aggregate; shutdown is coordinated across all of them.
//!
//! ## Features
//!
//! | Area          | Description                                                  | Key types / traits                     |
//! |---------------|--------------------------------------------------------------|----------------------------------------|
//! | **Fan-in**    | One accept surface over many listeners, first-ready order.   | [`MetaListener`], [`Connection`]       |
//! | **Transports**| The seam managed listeners implement; hardened TCP included. | [`Endpoint`], [`TcpEndpoint`]          |
//! | **Lifecycle** | Register/unregister, self-removal, drain, graceful close.    | [`MetaListener`], [`MetaError`]        |
//! | **Retries**   | Backoff between transient accept failures.                   | [`BackoffPolicy`], [`JitterPolicy`]    |
//! | **Events**    | Structured lifecycle events with non-blocking fan-out.       | [`Event`], [`Subscribe`]               |
//! | **Mirror**    | Loopback + onion + garlic + ACME TLS composition.            | [`mirror::Mirror`], [`mirror::MirrorConfig`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber
//!   _(demo/reference only)_.
//!
//! ```no_run
//! use std::sync::Arc;
//! use meta_listener::{MetaListener, TcpEndpoint};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ml = MetaListener::with_defaults();
//!
//!     let public = TcpEndpoint::bind("0.0.0.0:8080".parse()?).await?;
//!     let admin = TcpEndpoint::bind("127.0.0.1:9090".parse()?).await?;
//!     ml.register("public", Arc::new(public)).await?;
//!     ml.register("admin", Arc::new(admin)).await?;
//!
//!     loop {
//!         let conn = ml.accept().await?;
//!         println!("connection via {} from {}", conn.source(), conn.peer_addr());
//!     }
//! }
//! ```
//!
//! ---

mod config;
mod core;
mod endpoint;
mod error;
mod events;
pub mod mirror;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use core::MetaListener;
pub use endpoint::{
    BoxStream, Connection, Endpoint, EndpointAddr, EndpointRef, MetaAddr, Stream, TcpEndpoint,
};
pub use error::{AcceptClass, MetaError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
