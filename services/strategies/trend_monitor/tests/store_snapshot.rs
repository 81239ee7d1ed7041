//! MemoryStore snapshot persistence across restarts

use rust_decimal_macros::dec;
use tempfile::tempdir;
use trendline_monitor::{AlertStore, MemoryStore, MonitorStore, StoreError, UserConfigStore};
use trendline_types::{ChatId, ConfigKey, Toggle};

const CHAT: ChatId = ChatId(-100_123);

#[tokio::test]
async fn test_snapshot_round_trips_across_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("store.json");

    {
        let store = MemoryStore::with_snapshot(&path).unwrap();
        store.add(CHAT, "BTC/USDT", dec!(50000), Some("moon".to_string())).await.unwrap();
        store.add(CHAT, "ETH/USDT", dec!(3000.25), None).await.unwrap();
        store
            .add_symbols(CHAT, &["SOL/USDT".to_string(), "BTC/USDT".to_string()])
            .await
            .unwrap();
        store.set(CHAT, ConfigKey::IsFuture, "on").await.unwrap();
        store.set(CHAT, ConfigKey::AlertInterval, "15").await.unwrap();
    }
    assert!(path.exists());

    let reopened = MemoryStore::with_snapshot(&path).unwrap();
    let rules = reopened.list(CHAT).await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].target_price, dec!(50000));
    assert_eq!(rules[0].message.as_deref(), Some("moon"));
    assert_eq!(rules[1].target_price, dec!(3000.25));

    assert_eq!(
        reopened.list_symbols(CHAT).await.unwrap(),
        vec!["BTC/USDT".to_string(), "SOL/USDT".to_string()]
    );

    let config = reopened.get_or_create(CHAT).await.unwrap();
    assert_eq!(config.is_future, Toggle::On);
    assert_eq!(config.alert_interval, 15);

    assert_eq!(reopened.alert_owners().await.unwrap(), vec![CHAT]);
    assert_eq!(reopened.monitor_owners().await.unwrap(), vec![CHAT]);
}

#[tokio::test]
async fn test_delete_is_persisted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = MemoryStore::with_snapshot(&path).unwrap();
        store.add(CHAT, "BTC/USDT", dec!(1), None).await.unwrap();
        store.add(CHAT, "ETH/USDT", dec!(2), None).await.unwrap();
        assert!(store.delete(CHAT, 1).await.unwrap());
    }

    let reopened = MemoryStore::with_snapshot(&path).unwrap();
    let rules = reopened.list(CHAT).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].symbol, "ETH/USDT");
}

#[test]
fn test_corrupt_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, b"{ not json").unwrap();

    assert!(matches!(
        MemoryStore::with_snapshot(&path),
        Err(StoreError::Unavailable { .. })
    ));
}
