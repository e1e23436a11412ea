//! Mirror profile: composition, per-port manager reuse, concurrency,
//! hidden-TLS policy, and teardown.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockAcme, MockFactory};
use meta_listener::mirror::{Mirror, MirrorConfig, MirrorError};

#[tokio::test]
async fn concurrent_composes_on_one_port_create_one_manager_pair() {
    let factory = MockFactory::with_delay(Duration::from_millis(10));
    let stats = Arc::clone(&factory.stats);
    let cfg = MirrorConfig::new(factory);

    // Construction eagerly creates the manager pair for port 3000.
    let mirror = Arc::new(Mirror::new("race:3000", cfg).await.unwrap());
    assert_eq!(stats.onions(), 1);
    assert_eq!(stats.garlics(), 1);

    // Port 0 keeps all ten composes on one manager-map key while every
    // loopback bind still succeeds on its own ephemeral port.
    let mut composes = Vec::new();
    for _ in 0..10 {
        let mirror = Arc::clone(&mirror);
        composes.push(tokio::spawn(
            async move { mirror.listen("race:0", "").await },
        ));
    }

    let mut supervisors = Vec::new();
    for handle in composes {
        let composed = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("compose deadlocked")
            .unwrap()
            .expect("compose failed");
        supervisors.push(composed);
    }

    // Lazy creation for port 0 ran exactly once despite the contention.
    assert_eq!(stats.onions(), 2);
    assert_eq!(stats.garlics(), 2);

    for composed in supervisors {
        assert_eq!(composed.count().await, 3);
        composed.close().await.unwrap();
    }
    mirror.close().await.unwrap();
}

#[tokio::test]
async fn disabled_anonymity_composes_tcp_only() {
    let factory = MockFactory::new();
    let stats = Arc::clone(&factory.stats);
    let mut cfg = MirrorConfig::new(factory);
    cfg.disable_tor = true;
    cfg.disable_i2p = true;

    let mirror = Arc::new(Mirror::new("plain:3001", cfg).await.unwrap());
    assert_eq!(stats.onions(), 0);
    assert_eq!(stats.garlics(), 0);

    let mut composes = Vec::new();
    for i in 0..10 {
        let mirror = Arc::clone(&mirror);
        composes.push(tokio::spawn(async move {
            mirror.listen(&format!("plain-{i}:0"), "").await
        }));
    }

    for handle in composes {
        let composed = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("compose deadlocked")
            .unwrap()
            .expect("compose failed");
        assert_eq!(composed.count().await, 1);
        composed.close().await.unwrap();
    }

    assert_eq!(stats.onions(), 0);
    assert_eq!(stats.garlics(), 0);
    mirror.close().await.unwrap();
}

#[tokio::test]
async fn ssh_suffix_port_forces_plain_hidden_listeners() {
    let factory = MockFactory::new();
    let stats = Arc::clone(&factory.stats);
    let cfg = MirrorConfig::new(factory);
    assert!(cfg.hidden_tls, "hidden TLS defaults on");

    let mirror = Mirror::new("svc:5022", cfg).await.unwrap();

    let composed = mirror.listen("svc:5022", "").await.unwrap();
    assert_eq!(stats.plain_listens(), 2, "onion and garlic stay plain");
    assert_eq!(stats.tls_listens(), 0);
    composed.close().await.unwrap();

    let composed = mirror.listen("svc:5180", "").await.unwrap();
    assert_eq!(stats.tls_listens(), 2, "ordinary ports get hidden TLS");
    composed.close().await.unwrap();

    mirror.close().await.unwrap();
}

#[tokio::test]
async fn compose_registers_expected_member_ids() {
    let factory = MockFactory::new();
    let cfg = MirrorConfig::new(factory);
    let mirror = Mirror::new("members:5240", cfg).await.unwrap();

    let composed = mirror.listen("members:5240", "").await.unwrap();
    let mut ids = composed.ids().await;
    ids.sort();

    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&"5240".to_string()));
    assert!(ids.iter().any(|id| id.starts_with("onion-")));
    assert!(ids.iter().any(|id| id.starts_with("garlic-")));

    let addr = composed.addr().await.to_string();
    assert!(addr.starts_with("meta("));
    assert!(addr.contains("127.0.0.1:5240"));

    composed.close().await.unwrap();
    mirror.close().await.unwrap();
}

#[tokio::test]
async fn close_clears_managers_and_recreates_on_next_compose() {
    let factory = MockFactory::new();
    let stats = Arc::clone(&factory.stats);
    let cfg = MirrorConfig::new(factory);

    let mirror = Mirror::new("cycle:5301", cfg).await.unwrap();
    assert_eq!(stats.onions(), 1);

    mirror.close().await.unwrap();

    // Closed instances are not reused: the next compose mints new managers.
    let composed = mirror.listen("cycle:5301", "").await.unwrap();
    assert_eq!(stats.onions(), 2);
    assert_eq!(stats.garlics(), 2);
    composed.close().await.unwrap();
}

#[tokio::test]
async fn email_requests_acme_listener_with_configured_cert_dir() {
    let factory = MockFactory::new();
    let acme = MockAcme::new();
    let mut cfg = MirrorConfig::new(factory).with_acme(acme.clone());
    cfg.disable_tor = true;
    cfg.disable_i2p = true;

    let mirror = Mirror::new("example.org:5360", cfg).await.unwrap();
    let composed = mirror
        .listen("example.org:5360", "admin@example.org")
        .await
        .unwrap();

    {
        let bound = acme.bound.lock().unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].domain, "example.org:5360");
        assert_eq!(bound[0].allowed_domains, vec!["example.org:5360".to_string()]);
        assert_eq!(bound[0].email, "admin@example.org");
        assert_eq!(bound[0].cert_dir.to_str().unwrap(), "./certs");
    }

    let ids = composed.ids().await;
    assert!(ids.iter().any(|id| id.starts_with("tls-")));

    composed.close().await.unwrap();
    mirror.close().await.unwrap();
}

#[tokio::test]
async fn email_without_binder_is_an_error() {
    let factory = MockFactory::new();
    let mut cfg = MirrorConfig::new(factory);
    cfg.disable_tor = true;
    cfg.disable_i2p = true;

    let mirror = Mirror::new("nobinder:5420", cfg).await.unwrap();
    let err = mirror
        .listen("nobinder:5420", "admin@example.org")
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::AcmeUnavailable));

    mirror.close().await.unwrap();
}
