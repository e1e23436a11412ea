//! # Demo: mirror_compose
//!
//! Compose a Mirror listener out of loopback TCP plus stubbed onion and
//! garlic services. Real deployments implement [`ServiceFactory`] on top
//! of their Tor/I2P bindings; the stub here just shows the wiring.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► MirrorConfig::new(stub factory).from_env()
//!   │     └─► DISABLE_TOR / DISABLE_I2P / CERT_DIR honored
//!   ├─► Mirror::new("demo:0", cfg): managers created per port
//!   ├─► mirror.listen("demo:0", ""): fresh supervisor per call
//!   ├─► print the composed members
//!   └─► close the composed supervisor, then the mirror
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example mirror_compose
//! DISABLE_TOR=1 DISABLE_I2P=1 cargo run --example mirror_compose
//! ```

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use meta_listener::mirror::{HiddenService, HiddenServiceRef, Mirror, MirrorConfig, ServiceFactory};
use meta_listener::{Connection, Endpoint, EndpointAddr, EndpointRef};

/// A hidden-service listener that idles until closed.
struct StubListener {
    addr: EndpointAddr,
    closed: CancellationToken,
}

#[async_trait]
impl Endpoint for StubListener {
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

/// A hidden service that mints stub listeners under its label.
struct StubService {
    addr: EndpointAddr,
}

#[async_trait]
impl HiddenService for StubService {
    async fn listen(&self) -> io::Result<EndpointRef> {
        println!("[stub] plain listener at {}", self.addr);
        Ok(self.stub())
    }

    async fn listen_tls(&self) -> io::Result<EndpointRef> {
        println!("[stub] TLS listener at {}", self.addr);
        Ok(self.stub())
    }

    async fn close(&self) -> io::Result<()> {
        println!("[stub] service {} closed", self.addr);
        Ok(())
    }
}

impl StubService {
    fn stub(&self) -> EndpointRef {
        Arc::new(StubListener {
            addr: self.addr.clone(),
            closed: CancellationToken::new(),
        })
    }
}

struct StubFactory;

#[async_trait]
impl ServiceFactory for StubFactory {
    async fn onion(&self, label: &str) -> io::Result<HiddenServiceRef> {
        println!("[stub] creating onion manager '{label}'");
        Ok(Arc::new(StubService {
            addr: EndpointAddr::onion(format!("{label}.onion:443")),
        }))
    }

    async fn garlic(&self, label: &str, control: &str, wide: bool) -> io::Result<HiddenServiceRef> {
        println!("[stub] creating garlic manager '{label}' via {control} (wide={wide})");
        Ok(Arc::new(StubService {
            addr: EndpointAddr::garlic(format!("{label}.b32.i2p:443")),
        }))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = MirrorConfig::new(Arc::new(StubFactory)).from_env();
    let mirror = Mirror::new("demo:0", cfg).await?;

    let composed = mirror.listen("demo:0", "").await?;
    println!("composed listener: {}", composed.addr().await);
    for id in composed.ids().await {
        println!("  member: {id}");
    }

    composed.close().await?;
    mirror.close().await?;
    println!("mirror closed");
    Ok(())
}
