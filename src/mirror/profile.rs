//! # Mirror: per-port anonymity managers plus the composition routine.
//!
//! A [`Mirror`] holds one onion and one garlic manager per port and
//! composes fresh [`MetaListener`]s on demand:
//!
//! ```text
//! Mirror::listen(name, email)
//!   ├─► parse port from name (default "3000")
//!   ├─► hidden-TLS policy: config default, forced off for ports
//!   │   ending in "22" (SSH convention)
//!   ├─► fresh MetaListener for this call
//!   ├─► hardened loopback TCP on 127.0.0.1:<port>, id = <port>
//!   ├─► ensure per-port managers exist (write half of the RwLock,
//!   │   the single point where composes may race)
//!   ├─► onion listener  → id onion-<address>   (skipped when Tor disabled)
//!   ├─► garlic listener → id garlic-<address>  (skipped when I2P disabled)
//!   ├─► ACME TLS listener → id tls-<address>   (when email is non-empty)
//!   └─► return the composed supervisor; the caller owns and closes it
//! ```
//!
//! Managers are created lazily per port and reused across composes to
//! amortize circuit establishment; they are torn down only by
//! [`Mirror::close`].

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::core::MetaListener;
use crate::endpoint::{Endpoint, TcpEndpoint};
use crate::error::MetaError;
use crate::mirror::managers::{AcmeBinder, HiddenService, HiddenServiceRef, ServiceFactory, TlsParams};

/// Fallback port when the name carries none.
const DEFAULT_PORT: &str = "3000";

/// Certificate cache directory unless overridden.
const DEFAULT_CERT_DIR: &str = "./certs";

/// Default I2P SAM control endpoint.
const DEFAULT_I2P_CONTROL: &str = "127.0.0.1:7656";

/// # Errors produced by the Mirror profile.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Creating an anonymity manager failed.
    #[error("creating {kind} manager for port {port}: {source}")]
    Manager {
        /// `"onion"` or `"garlic"`.
        kind: &'static str,
        /// The port the manager would have been keyed under.
        port: String,
        /// The factory's error.
        source: io::Error,
    },

    /// A compose found no manager for its port.
    #[error("no {kind} instance found for port {port}")]
    ManagerMissing {
        /// `"onion"` or `"garlic"`.
        kind: &'static str,
        /// The port that was looked up.
        port: String,
    },

    /// Binding the local TCP listener failed.
    #[error("failed to create TCP listener on {addr}: {source}")]
    Bind {
        /// The loopback address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Opening an onion, garlic, or TLS listener failed.
    #[error("opening {kind} listener: {source}")]
    Listen {
        /// `"onion"`, `"garlic"`, or `"tls"`.
        kind: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An email was given but no ACME binder is configured.
    #[error("no ACME binder configured for TLS listener")]
    AcmeUnavailable,

    /// Errors collected while closing the Mirror.
    #[error("errors closing mirror: {}", errors.join("; "))]
    Close {
        /// One message per failed close.
        errors: Vec<String>,
    },

    /// An error from the underlying meta listener.
    #[error(transparent)]
    Meta(#[from] MetaError),
}

impl MirrorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MirrorError::Manager { .. } => "mirror_manager",
            MirrorError::ManagerMissing { .. } => "mirror_manager_missing",
            MirrorError::Bind { .. } => "mirror_bind",
            MirrorError::Listen { .. } => "mirror_listen",
            MirrorError::AcmeUnavailable => "mirror_acme_unavailable",
            MirrorError::Close { .. } => "mirror_close",
            MirrorError::Meta(e) => e.as_label(),
        }
    }
}

/// Configuration for a [`Mirror`].
///
/// The process-wide toggles of historical deployments (certificate
/// directory, hidden-TLS default, disable flags) live here; binaries that
/// want environment-driven behavior overlay it once with
/// [`MirrorConfig::from_env`] at startup.
#[derive(Clone)]
pub struct MirrorConfig {
    /// Skip creating Tor managers and onion listeners.
    pub disable_tor: bool,
    /// Skip creating I2P managers and garlic listeners.
    pub disable_i2p: bool,
    /// Layer TLS over the anonymity listeners by default.
    ///
    /// Forced off per compose when the port string ends in `"22"`.
    pub hidden_tls: bool,
    /// Certificate cache directory handed to the ACME binder.
    pub cert_dir: PathBuf,
    /// I2P SAM control endpoint.
    pub i2p_control: String,
    /// Factory minting onion/garlic managers.
    pub factory: Arc<dyn ServiceFactory>,
    /// Optional ACME TLS binder; required for composes with an email.
    pub acme: Option<Arc<dyn AcmeBinder>>,
    /// Configuration applied to every composed supervisor.
    pub supervisor: Config,
}

impl MirrorConfig {
    /// Creates a config with defaults: Tor and I2P enabled, hidden TLS on,
    /// certificates under `./certs`, SAM at `127.0.0.1:7656`.
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self {
            disable_tor: false,
            disable_i2p: false,
            hidden_tls: true,
            cert_dir: PathBuf::from(DEFAULT_CERT_DIR),
            i2p_control: DEFAULT_I2P_CONTROL.to_string(),
            factory,
            acme: None,
            supervisor: Config::default(),
        }
    }

    /// Sets the ACME binder used for public-domain TLS listeners.
    pub fn with_acme(mut self, acme: Arc<dyn AcmeBinder>) -> Self {
        self.acme = Some(acme);
        self
    }

    /// Overlays environment variables onto this config.
    ///
    /// `DISABLE_TOR` and `DISABLE_I2P` accept `1` or case-insensitive
    /// `true`. `CERT_DIR` applies only while the programmatic value is
    /// still the default.
    pub fn from_env(mut self) -> Self {
        if env_flag("DISABLE_TOR") {
            self.disable_tor = true;
        }
        if env_flag("DISABLE_I2P") {
            self.disable_i2p = true;
        }
        if self.cert_dir == Path::new(DEFAULT_CERT_DIR) {
            if let Ok(dir) = std::env::var("CERT_DIR") {
                if !dir.is_empty() {
                    self.cert_dir = PathBuf::from(dir);
                }
            }
        }
        self
    }
}

/// Per-port manager maps; guarded together by one reader/writer lock.
#[derive(Default)]
struct Managers {
    onions: HashMap<String, HiddenServiceRef>,
    garlics: HashMap<String, HiddenServiceRef>,
}

/// Composes multiplexed listeners out of loopback TCP, onion, garlic, and
/// optional ACME TLS members.
pub struct Mirror {
    base: MetaListener,
    cfg: MirrorConfig,
    managers: RwLock<Managers>,
}

impl Mirror {
    /// Creates a Mirror named `name` (typically `host:port`).
    ///
    /// Whitespace is stripped; an empty name becomes `"mirror"`. One onion
    /// and one garlic manager are created eagerly under the label
    /// `metalistener-<name>`, keyed by the port parsed from the name
    /// (default `"3000"`), unless the respective toggle disables them.
    pub async fn new(name: &str, cfg: MirrorConfig) -> Result<Self, MirrorError> {
        let name = sanitize_name(name);
        let port = parse_port(&name);
        let label = format!("metalistener-{name}");

        let mut managers = Managers::default();
        if !cfg.disable_tor {
            let onion =
                cfg.factory
                    .onion(&label)
                    .await
                    .map_err(|source| MirrorError::Manager {
                        kind: "onion",
                        port: port.clone(),
                        source,
                    })?;
            managers.onions.insert(port.clone(), onion);
        }
        if !cfg.disable_i2p {
            let garlic = cfg
                .factory
                .garlic(&label, &cfg.i2p_control, true)
                .await
                .map_err(|source| MirrorError::Manager {
                    kind: "garlic",
                    port: port.clone(),
                    source,
                })?;
            managers.garlics.insert(port, garlic);
        }

        Ok(Self {
            base: MetaListener::new(cfg.supervisor.clone(), Vec::new()),
            cfg,
            managers: RwLock::new(managers),
        })
    }

    /// The embedded supervisor created with the Mirror.
    ///
    /// Composed supervisors returned by [`Mirror::listen`] are separate;
    /// this one exists for callers that accept on the Mirror itself.
    pub fn base(&self) -> &MetaListener {
        &self.base
    }

    /// Composes a fresh multiplexed listener for `name`.
    ///
    /// Registers a hardened loopback TCP listener, onion and garlic
    /// listeners (unless disabled), and, when `email` is non-empty, an
    /// ACME-managed TLS listener for the public domain `name`. The
    /// returned supervisor belongs to the caller, who closes it; the
    /// Mirror keeps only the per-port managers.
    pub async fn listen(&self, name: &str, email: &str) -> Result<MetaListener, MirrorError> {
        let port = parse_port(name);
        let hidden_tls = hidden_tls_for_port(&port, self.cfg.hidden_tls);
        let composed = MetaListener::new(self.cfg.supervisor.clone(), Vec::new());

        let local: SocketAddr = format!("127.0.0.1:{port}")
            .parse()
            .map_err(|e| MirrorError::Bind {
                addr: format!("127.0.0.1:{port}"),
                source: io::Error::new(io::ErrorKind::InvalidInput, format!("{e}")),
            })?;
        let tcp = TcpEndpoint::bind(local)
            .await
            .map_err(|source| MirrorError::Bind {
                addr: local.to_string(),
                source,
            })?;
        composed.register(port.clone(), Arc::new(tcp)).await?;

        let label = format!("metalistener-{name}-{port}");
        self.ensure_managers(&port, &label).await?;

        if !self.cfg.disable_tor {
            let onion = self.onion_for(&port).await?;
            let listener = if hidden_tls {
                onion.listen_tls().await
            } else {
                onion.listen().await
            }
            .map_err(|source| MirrorError::Listen {
                kind: "onion",
                source,
            })?;
            let id = format!("onion-{}", listener.addr());
            composed.register(id, listener).await?;
        }

        if !self.cfg.disable_i2p {
            let garlic = self.garlic_for(&port).await?;
            let listener = if hidden_tls {
                garlic.listen_tls().await
            } else {
                garlic.listen().await
            }
            .map_err(|source| MirrorError::Listen {
                kind: "garlic",
                source,
            })?;
            let id = format!("garlic-{}", listener.addr());
            composed.register(id, listener).await?;
        }

        if !email.is_empty() {
            let acme = self.cfg.acme.as_ref().ok_or(MirrorError::AcmeUnavailable)?;
            let params = TlsParams {
                domain: name.to_string(),
                allowed_domains: vec![name.to_string()],
                cert_dir: self.cfg.cert_dir.clone(),
                email: email.to_string(),
            };
            let listener = acme
                .bind(params)
                .await
                .map_err(|source| MirrorError::Listen {
                    kind: "tls",
                    source,
                })?;
            let id = format!("tls-{}", listener.addr());
            composed.register(id, listener).await?;
        }

        Ok(composed)
    }

    /// Closes the embedded supervisor, then every onion and garlic manager,
    /// then clears the maps so closed instances cannot be reused.
    pub async fn close(&self) -> Result<(), MirrorError> {
        let mut errors = Vec::new();
        if let Err(e) = self.base.close().await {
            errors.push(format!("meta: {e}"));
        }

        let mut managers = self.managers.write().await;
        for (port, onion) in managers.onions.drain() {
            if let Err(e) = onion.close().await {
                errors.push(format!("onion {port}: {e}"));
            }
        }
        for (port, garlic) in managers.garlics.drain() {
            if let Err(e) = garlic.close().await {
                errors.push(format!("garlic {port}: {e}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MirrorError::Close { errors })
        }
    }

    /// Creates missing managers for `port` under the write half of the
    /// Mirror lock; the single place where compose calls mutate shared
    /// state.
    async fn ensure_managers(&self, port: &str, label: &str) -> Result<(), MirrorError> {
        let mut managers = self.managers.write().await;

        if !self.cfg.disable_tor && !managers.onions.contains_key(port) {
            let onion =
                self.cfg
                    .factory
                    .onion(label)
                    .await
                    .map_err(|source| MirrorError::Manager {
                        kind: "onion",
                        port: port.to_string(),
                        source,
                    })?;
            managers.onions.insert(port.to_string(), onion);
        }

        if !self.cfg.disable_i2p && !managers.garlics.contains_key(port) {
            let garlic = self
                .cfg
                .factory
                .garlic(label, &self.cfg.i2p_control, true)
                .await
                .map_err(|source| MirrorError::Manager {
                    kind: "garlic",
                    port: port.to_string(),
                    source,
                })?;
            managers.garlics.insert(port.to_string(), garlic);
        }

        Ok(())
    }

    /// Looks the onion manager up under the read half of the lock.
    async fn onion_for(&self, port: &str) -> Result<HiddenServiceRef, MirrorError> {
        self.managers
            .read()
            .await
            .onions
            .get(port)
            .cloned()
            .ok_or_else(|| MirrorError::ManagerMissing {
                kind: "onion",
                port: port.to_string(),
            })
    }

    /// Looks the garlic manager up under the read half of the lock.
    async fn garlic_for(&self, port: &str) -> Result<HiddenServiceRef, MirrorError> {
        self.managers
            .read()
            .await
            .garlics
            .get(port)
            .cloned()
            .ok_or_else(|| MirrorError::ManagerMissing {
                kind: "garlic",
                port: port.to_string(),
            })
    }
}

/// Strips all whitespace from the name, defaulting to `"mirror"`.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        "mirror".to_string()
    } else {
        cleaned
    }
}

/// Extracts the port from a `host:port` name, defaulting to `"3000"`.
fn parse_port(name: &str) -> String {
    match name.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => port.to_string(),
        _ => DEFAULT_PORT.to_string(),
    }
}

/// Hidden-TLS policy for one port.
///
/// Ports ending in `"22"` follow the SSH convention and stay plain; TLS
/// over the anonymity transport would break ssh clients expecting the raw
/// protocol.
fn hidden_tls_for_port(port: &str, default: bool) -> bool {
    if port.ends_with("22") {
        return false;
    }
    default
}

fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_parsing_defaults_to_3000() {
        assert_eq!(parse_port("example.com:8080"), "8080");
        assert_eq!(parse_port("localhost"), "3000");
        assert_eq!(parse_port("bad:99999"), "3000");
        assert_eq!(parse_port("svc:"), "3000");
        assert_eq!(parse_port(""), "3000");
    }

    #[test]
    fn name_sanitizing_defaults_to_mirror() {
        assert_eq!(sanitize_name("  my host:80  "), "myhost:80");
        assert_eq!(sanitize_name("   "), "mirror");
    }

    #[test]
    fn ssh_style_ports_stay_plain() {
        assert!(!hidden_tls_for_port("22", true));
        assert!(!hidden_tls_for_port("1022", true));
        assert!(!hidden_tls_for_port("5022", true));
        assert!(hidden_tls_for_port("8080", true));
        assert!(!hidden_tls_for_port("8080", false));
    }
}
