//! Integration tests for the Redis counter store.
//!
//! These tests require a Redis instance running at `redis://127.0.0.1/`.
//! They are ignored by default - run with
//! `cargo test -p edgeguard-service --test redis_store -- --ignored`

use std::time::Duration;

use edgeguard_service::{CounterStore, GatekeeperError, RedisCounterStore};

const REDIS_URL: &str = "redis://127.0.0.1/";

async fn connect() -> Option<RedisCounterStore> {
    RedisCounterStore::connect(REDIS_URL, Duration::from_secs(2))
        .await
        .ok()
}

/// Unique key per test run so reruns never see stale counters.
fn unique_key(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("edgeguard-test:{name}:{nanos}")
}

#[tokio::test]
async fn invalid_url_is_configuration_error() {
    let err = RedisCounterStore::connect("not-a-redis-url", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, GatekeeperError::Configuration(_)));
}

#[tokio::test]
#[ignore] // Requires Redis
async fn increments_are_sequential() {
    let Some(store) = connect().await else {
        eprintln!("Skipping test: Redis not available at {REDIS_URL}");
        return;
    };
    let key = unique_key("seq");

    for expected in 1..=5 {
        let count = store
            .increment_and_get(&key, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(count, expected);
    }
    assert_eq!(store.kind(), "redis");
    store.ping().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn window_expiry_restarts_count() {
    let Some(store) = connect().await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    let key = unique_key("expiry");

    store
        .increment_and_get(&key, Duration::from_secs(1))
        .await
        .unwrap();
    store
        .increment_and_get(&key, Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let count = store
        .increment_and_get(&key, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore] // Requires Redis
async fn concurrent_increments_are_not_lost() {
    let Some(store) = connect().await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    let key = unique_key("burst");

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let store = store.clone();
            let key = key.clone();
            tokio::spawn(async move {
                store
                    .increment_and_get(&key, Duration::from_secs(30))
                    .await
            })
        })
        .collect();

    let mut seen = Vec::new();
    for h in handles {
        seen.push(h.await.unwrap().unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=50).collect::<Vec<u64>>());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn hash_fields_round_trip() {
    let Some(store) = connect().await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    let key = unique_key("stats");

    assert!(store.read_fields(&key).await.unwrap().is_empty());
    store
        .increment_fields(&key, &["total", "humans"])
        .await
        .unwrap();
    store.increment_fields(&key, &["total", "bots"]).await.unwrap();

    let fields = store.read_fields(&key).await.unwrap();
    assert_eq!(fields["total"], 2);
    assert_eq!(fields["humans"], 1);
    assert_eq!(fields["bots"], 1);
}
