//! End-to-end coverage of the RPC surface (C8): a real `RolexEngine` served
//! over a real TCP loopback connection, driven through [`RolexClient`]
//! exactly as a compute-node caller would.

use std::sync::Arc;

use rolex::rpc::{serve, RolexClient};
use rolex::{RolexConfig, RolexEngine};
use tokio::net::TcpListener;

fn config() -> RolexConfig {
    RolexConfig {
        epsilon: 2,
        syn_max: 16,
        upper_reserved: 4096,
        leaf_capacity: 64,
    }
}

async fn spawn_server() -> std::net::SocketAddr {
    let keys: Vec<u64> = (1..=8).map(|i| i * 10).collect();
    let vals = keys.clone();
    let engine = Arc::new(RolexEngine::<4>::train(&keys, &vals, config()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    tokio::spawn(async move {
        let _ = serve(engine, addr).await;
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    addr
}

#[tokio::test]
async fn get_returns_present_and_absent_correctly() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    assert_eq!(client.get(30).await.unwrap(), Some(30));
    assert_eq!(client.get(25).await.unwrap(), None);
}

#[tokio::test]
async fn put_then_get_round_trips_a_new_key() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    client.put(15, 150).await.unwrap();
    assert_eq!(client.get(15).await.unwrap(), Some(150));
}

#[tokio::test]
async fn put_on_an_existing_key_overwrites_in_place() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    client.put(30, 999).await.unwrap();
    assert_eq!(client.get(30).await.unwrap(), Some(999));
}

#[tokio::test]
async fn update_and_delete_round_trip() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    assert!(client.update(40, 4000).await.unwrap());
    assert_eq!(client.get(40).await.unwrap(), Some(4000));
    assert!(client.delete(40).await.unwrap());
    assert_eq!(client.get(40).await.unwrap(), None);
    assert!(!client.delete(40).await.unwrap());
}

#[tokio::test]
async fn scan_returns_values_in_key_order() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    let values = client.scan(25, 4).await.unwrap();
    assert_eq!(values, vec![30, 40, 50, 60]);
}

#[tokio::test]
async fn scan_with_no_matches_returns_empty() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    assert!(client.scan(10_000, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_connection_handles_many_sequential_requests() {
    let addr = spawn_server().await;
    let mut client = RolexClient::connect(addr).await.unwrap();
    for i in 0..20u64 {
        client.put(1000 + i, i).await.unwrap();
    }
    for i in 0..20u64 {
        assert_eq!(client.get(1000 + i).await.unwrap(), Some(i));
    }
}

#[tokio::test]
async fn two_clients_can_talk_to_the_same_server_concurrently() {
    let addr = spawn_server().await;
    let mut a = RolexClient::connect(addr).await.unwrap();
    let mut b = RolexClient::connect(addr).await.unwrap();
    a.put(2000, 1).await.unwrap();
    b.put(2001, 2).await.unwrap();
    assert_eq!(a.get(2001).await.unwrap(), Some(2));
    assert_eq!(b.get(2000).await.unwrap(), Some(1));
}
