//! Listener core: the supervisor and its per-source workers.
//!
//! The only public API re-exported from here is [`MetaListener`]; the
//! worker is an internal building block the supervisor wires up.
//!
//! ## Files & responsibilities
//! - **supervisor.rs**: public façade; owns the registry, fan-in channel,
//!   shutdown token, removal loop, worker tracker and event channel;
//!   drives register/unregister/accept/close/drain.
//! - **worker.rs**: one accept loop per source listener: races accept
//!   against shutdown, classifies errors (timeout / transient / fatal),
//!   forwards connections with a bounded offer, requests self-removal on
//!   fatal errors, survives transport panics.
//!
//! ## Data plane
//! ```text
//! register(id, endpoint)
//!   └─► entries[id] = endpoint, spawn Worker (tracked)
//!
//! Worker (per source)                      MetaListener::accept()
//!   accept → classify → forward ──► fan-in channel ──► caller
//!   fatal error ──► removal channel
//!                        │
//!            removal loop (background):
//!              delete entry under lock, close endpoint,
//!              publish ListenerEvicted
//!
//! close()
//!   cancel shutdown token ──► every worker select wakes and exits
//!   close every entry, drain workers within the grace window
//! ```

mod supervisor;
mod worker;

pub use supervisor::MetaListener;
