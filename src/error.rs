//! # Error types used by the meta listener.
//!
//! This module defines two layers of error handling:
//!
//! - [`MetaError`] errors surfaced by the public listener API.
//! - [`AcceptClass`] classification of inner-listener accept failures,
//!   which drives the per-source worker loop.
//!
//! [`MetaError`] provides `as_label` for logs/metrics. [`AcceptClass`] has
//! `is_timeout()`, `is_transient()` and `is_fatal()` predicates.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the meta listener surface.
///
/// These represent failures of the aggregate itself, not of any single
/// underlying transport.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MetaError {
    /// The meta listener has been closed; accept and register are rejected.
    #[error("listener is closed")]
    Closed,

    /// A shutdown wait has begun; new registrations are rejected.
    #[error("cannot add listener during shutdown")]
    ShuttingDown,

    /// Attempted to register a listener under an id that is already taken.
    #[error("listener with ID '{id}' already exists")]
    DuplicateId {
        /// The duplicate listener id.
        id: String,
    },

    /// Attempted to unregister a listener that is not in the registry.
    #[error("no listener with ID '{id}' exists")]
    NotFound {
        /// The missing listener id.
        id: String,
    },

    /// The meta listener currently manages no listeners.
    ///
    /// Only informational queries return this; `accept` never synthesizes
    /// it and instead blocks until a listener is registered or the meta
    /// listener is closed.
    #[error("no active listeners")]
    NoListeners,

    /// The drain deadline elapsed while workers were still running.
    #[error("drain deadline {deadline:?} exceeded")]
    DrainDeadline {
        /// The deadline that was given to `wait_for_drain`.
        deadline: Duration,
    },

    /// Closing an individual listener failed.
    #[error("closing listener '{id}': {source}")]
    CloseEndpoint {
        /// The id of the listener whose close failed.
        id: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// One or more inner listeners failed to close during shutdown.
    ///
    /// All constituent messages are preserved.
    #[error("errors closing listeners: {}", errors.join("; "))]
    Close {
        /// One message per failed inner close, as `<id>: <error>`.
        errors: Vec<String>,
    },
}

impl MetaError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MetaError::Closed => "meta_closed",
            MetaError::ShuttingDown => "meta_shutting_down",
            MetaError::DuplicateId { .. } => "meta_duplicate_id",
            MetaError::NotFound { .. } => "meta_not_found",
            MetaError::NoListeners => "meta_no_listeners",
            MetaError::DrainDeadline { .. } => "meta_drain_deadline",
            MetaError::CloseEndpoint { .. } => "meta_close_endpoint",
            MetaError::Close { .. } => "meta_close",
        }
    }
}

/// # Classification of accept failures.
///
/// The per-source worker maps every accept error into one of three classes
/// which fully determine its next step:
///
/// - [`AcceptClass::Timeout`] deadline-induced; retry immediately.
/// - [`AcceptClass::Transient`] likely to clear on its own; back off, retry.
/// - [`AcceptClass::Fatal`] the listener is not coming back; the worker
///   requests its own removal and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptClass {
    /// The accept ran into a deadline; no backoff is needed.
    Timeout,
    /// Transient failure: connection reset, aborted, broken pipe, or the
    /// listener explicitly marked the error temporary.
    Transient,
    /// Everything else. The source listener is treated as dead.
    Fatal,
}

impl AcceptClass {
    /// Classifies an I/O error from an inner listener's accept.
    pub fn of(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => AcceptClass::Timeout,
            io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted => AcceptClass::Transient,
            _ => AcceptClass::Fatal,
        }
    }

    /// True for deadline-induced errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AcceptClass::Timeout)
    }

    /// True for errors that warrant backoff-and-retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AcceptClass::Transient)
    }

    /// True for errors that end the worker.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AcceptClass::Fatal)
    }

    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            AcceptClass::Timeout => "accept_timeout",
            AcceptClass::Transient => "accept_transient",
            AcceptClass::Fatal => "accept_fatal",
        }
    }
}
