//! Mirror profile: one loopback TCP listener, one Tor onion listener, one
//! I2P garlic listener, and optionally an automatic-certificate TLS
//! listener, composed into a fresh [`MetaListener`](crate::MetaListener)
//! per call.
//!
//! The anonymity services and the ACME machinery are consumed interfaces:
//! callers inject implementations through [`ServiceFactory`] and
//! [`AcmeBinder`]; this crate ships none.

mod managers;
mod profile;

pub use managers::{AcmeBinder, HiddenService, HiddenServiceRef, ServiceFactory, TlsParams};
pub use profile::{Mirror, MirrorConfig, MirrorError};
