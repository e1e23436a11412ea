//! # Demo: fan_in
//!
//! Aggregate two TCP listeners behind one accept surface, narrate the
//! lifecycle through an attached subscriber, then shut everything down.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► MetaListener::new(cfg, vec![Printer])
//!   │     └─► Printer runs on its own delivery worker
//!   ├─► bind two hardened TCP listeners on ephemeral loopback ports
//!   ├─► register("alpha", …), register("beta", …)
//!   ├─► dial each listener once, accept both connections
//!   └─► close(): both accepts drained, workers exit within the grace window
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fan_in
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use meta_listener::{Config, Event, MetaListener, Subscribe, TcpEndpoint};

/// Prints every lifecycle event as it is delivered.
struct Printer;

#[async_trait]
impl Subscribe for Printer {
    async fn on_event(&self, ev: &Event) {
        println!("[event] {:?} listener={:?}", ev.kind, ev.listener);
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Printer)];
    let ml = Arc::new(MetaListener::new(Config::default(), subs));

    let alpha = TcpEndpoint::bind("127.0.0.1:0".parse()?).await?;
    let beta = TcpEndpoint::bind("127.0.0.1:0".parse()?).await?;
    let alpha_addr = alpha.local_addr();
    let beta_addr = beta.local_addr();

    ml.register("alpha", Arc::new(alpha)).await?;
    ml.register("beta", Arc::new(beta)).await?;
    println!("listening on {}", ml.addr().await);

    // Dial both members.
    for (name, addr) in [("alpha", alpha_addr), ("beta", beta_addr)] {
        let mut client = TcpStream::connect(addr).await?;
        client.write_all(name.as_bytes()).await?;
        tokio::spawn(async move {
            let mut buf = [0u8; 16];
            let _ = client.read(&mut buf).await;
        });
    }

    // Two accepts, first-ready order; the source tag says who accepted.
    for _ in 0..2 {
        let mut conn = ml.accept().await?;
        let mut buf = [0u8; 5];
        let n = conn.read(&mut buf).await?;
        println!(
            "connection via {} from {}: {:?}",
            conn.source(),
            conn.peer_addr(),
            std::str::from_utf8(&buf[..n])?,
        );
        conn.write_all(b"ok").await?;
    }

    ml.close().await?;
    println!("closed: {}", ml.addr().await);

    // Give the printer's worker a beat to drain the shutdown events.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}
