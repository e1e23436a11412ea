//! # Consumed interfaces: anonymity services and ACME TLS.
//!
//! The Mirror profile does not implement Tor, I2P, or certificate issuance.
//! It consumes them through the traits below, which callers implement on
//! top of whatever bindings their deployment uses.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::endpoint::EndpointRef;

/// Shared handle to a hidden-service manager.
pub type HiddenServiceRef = Arc<dyn HiddenService>;

/// Long-lived manager of one Tor onion or I2P garlic service identity.
///
/// Establishing the underlying circuits is expensive, so the Mirror
/// creates one manager per port and reuses it across composes; managers
/// outlive the composed supervisors and are only torn down by
/// [`Mirror::close`](crate::mirror::Mirror::close).
#[async_trait]
pub trait HiddenService: Send + Sync + 'static {
    /// Opens a plain listener over the anonymity transport.
    async fn listen(&self) -> io::Result<EndpointRef>;

    /// Opens a TLS listener layered over the anonymity transport.
    async fn listen_tls(&self) -> io::Result<EndpointRef>;

    /// Tears the service identity down.
    async fn close(&self) -> io::Result<()>;
}

/// Mints [`HiddenService`] managers from persistent identity labels.
#[async_trait]
pub trait ServiceFactory: Send + Sync + 'static {
    /// Creates a Tor onion manager. The label keys the persistent service
    /// identity.
    async fn onion(&self, label: &str) -> io::Result<HiddenServiceRef>;

    /// Creates an I2P garlic manager connected to the given SAM control
    /// endpoint. `wide` requests the wide-distribution tunnel profile.
    async fn garlic(&self, label: &str, control: &str, wide: bool)
        -> io::Result<HiddenServiceRef>;
}

/// Parameters for an automatic-certificate TLS listener.
#[derive(Clone, Debug)]
pub struct TlsParams {
    /// The public domain the certificate is issued for.
    pub domain: String,
    /// Domains the listener will serve.
    pub allowed_domains: Vec<String>,
    /// Where certificates are cached between runs.
    pub cert_dir: PathBuf,
    /// Registration email for the ACME account.
    pub email: String,
}

/// Binds ACME-managed TLS listeners for public domains.
#[async_trait]
pub trait AcmeBinder: Send + Sync + 'static {
    /// Binds a listener that performs automatic certificate issuance for
    /// `params.domain`.
    async fn bind(&self, params: TlsParams) -> io::Result<EndpointRef>;
}
