//! Fan-in behavior: source ordering, tagging, data flow, addresses.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use common::MockEndpoint;
use meta_listener::MetaListener;

#[tokio::test]
async fn fan_in_preserves_per_source_order() {
    let ml = MetaListener::with_defaults();
    let a = MockEndpoint::new("127.0.0.1:8080");
    let b = MockEndpoint::new("127.0.0.1:8081");
    ml.register("A", a.clone()).await.unwrap();
    ml.register("B", b.clone()).await.unwrap();

    let _ca1 = a.push("a1").await;
    let _cb1 = b.push("b1").await;
    let _ca2 = a.push("a2").await;

    let mut accepted = Vec::new();
    for _ in 0..3 {
        let conn = tokio::time::timeout(Duration::from_secs(2), ml.accept())
            .await
            .expect("accept timed out")
            .expect("accept failed");
        accepted.push((conn.source().to_string(), conn.peer_addr().to_string()));
    }

    let mut by_source: HashMap<String, Vec<String>> = HashMap::new();
    for (src, peer) in accepted {
        by_source.entry(src).or_default().push(peer);
    }
    assert_eq!(by_source["A"], vec!["a1", "a2"]);
    assert_eq!(by_source["B"], vec!["b1"]);

    ml.close().await.unwrap();
}

#[tokio::test]
async fn every_source_contributes_its_connections_in_order() {
    let ml = MetaListener::with_defaults();
    let sources = 3;
    let per_source = 4;

    let mut endpoints = Vec::new();
    for s in 0..sources {
        let ep = MockEndpoint::new(&format!("127.0.0.1:90{s}0"));
        ml.register(format!("src-{s}"), ep.clone()).await.unwrap();
        endpoints.push(ep);
    }
    for k in 0..per_source {
        for (s, ep) in endpoints.iter().enumerate() {
            let _ = ep.push(&format!("conn-{s}-{k}")).await;
        }
    }

    let mut by_source: HashMap<String, Vec<String>> = HashMap::new();
    for _ in 0..sources * per_source {
        let conn = tokio::time::timeout(Duration::from_secs(2), ml.accept())
            .await
            .expect("accept timed out")
            .expect("accept failed");
        by_source
            .entry(conn.source().to_string())
            .or_default()
            .push(conn.peer_addr().to_string());
    }

    for s in 0..sources {
        let expected: Vec<String> = (0..per_source).map(|k| format!("conn-{s}-{k}")).collect();
        assert_eq!(by_source[&format!("src-{s}")], expected);
    }

    ml.close().await.unwrap();
}

#[tokio::test]
async fn accepted_connections_carry_data() {
    let ml = MetaListener::with_defaults();
    let ep = MockEndpoint::new("127.0.0.1:8080");
    ml.register("data", ep.clone()).await.unwrap();

    let mut client = ep.push("client").await;
    client.write_all(b"ping").await.unwrap();

    let mut conn = ml.accept().await.unwrap();
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");

    conn.write_all(b"pong").await.unwrap();
    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"pong");

    ml.close().await.unwrap();
}

#[tokio::test]
async fn composite_addr_enumerates_members() {
    let ml = MetaListener::with_defaults();
    assert_eq!(ml.addr().await.to_string(), "meta(empty)");
    assert_eq!(ml.addr().await.network(), "meta");

    let ep = MockEndpoint::new("127.0.0.1:8080");
    ml.register("only", ep).await.unwrap();
    assert_eq!(ml.addr().await.to_string(), "meta(127.0.0.1:8080)");

    ml.close().await.unwrap();
}
