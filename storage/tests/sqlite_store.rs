use chrono::{Duration, Utc};
use lens_core::traits::LogStore;
use lens_core::types::{LogLevel, NewLogEntry};
use storage::SqliteLogStore;

fn entry_at(offset_secs: i64, level: LogLevel, service: &str, message: &str) -> NewLogEntry {
    let mut entry = NewLogEntry::new(level, service, message);
    entry.timestamp = Some(Utc::now() + Duration::seconds(offset_secs));
    entry
}

#[tokio::test]
async fn append_assigns_ids_and_stamps_missing_timestamps() {
    let store = SqliteLogStore::in_memory().await.unwrap();

    let before = Utc::now();
    let stored = store
        .append(NewLogEntry::new(
            LogLevel::Info,
            "auth-service",
            "User login successful",
        ))
        .await
        .unwrap();

    assert!(stored.id.is_some());
    assert!(stored.timestamp >= before);
    assert!(stored.timestamp <= Utc::now());
}

#[tokio::test]
async fn recent_returns_chronological_window() {
    let store = SqliteLogStore::in_memory().await.unwrap();
    for offset in [30, 10, 50, 20, 40] {
        store
            .append(entry_at(
                offset,
                LogLevel::Info,
                "db-shard-01",
                &format!("event {offset}"),
            ))
            .await
            .unwrap();
    }

    let window = store.recent(3).await.unwrap();
    assert_eq!(window.len(), 3);
    assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(window[0].message, "event 30");
    assert_eq!(window[2].message, "event 50");
}

#[tokio::test]
async fn recent_bounds_by_available_entries() {
    let store = SqliteLogStore::in_memory().await.unwrap();
    store
        .append(entry_at(0, LogLevel::Warn, "frontend-proxy", "one"))
        .await
        .unwrap();

    let window = store.recent(20).await.unwrap();
    assert_eq!(window.len(), 1);
}

#[tokio::test]
async fn level_filter_and_limit() {
    let store = SqliteLogStore::in_memory().await.unwrap();
    for (offset, level, message) in [
        (1, LogLevel::Info, "a"),
        (2, LogLevel::Error, "b"),
        (3, LogLevel::Info, "c"),
        (4, LogLevel::Error, "d"),
    ] {
        store
            .append(entry_at(offset, level, "payment-gateway", message))
            .await
            .unwrap();
    }

    let errors = store
        .recent_filtered(Some(LogLevel::Error), 50)
        .await
        .unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "d");
    assert_eq!(errors[1].message, "b");

    let limited = store.recent_filtered(None, 2).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].message, "d");
}

#[tokio::test]
async fn level_round_trips_through_text_column() {
    let store = SqliteLogStore::in_memory().await.unwrap();
    for level in [LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
        store
            .append(entry_at(0, level, "recommendation-engine", "x"))
            .await
            .unwrap();
    }

    let all = store.recent(10).await.unwrap();
    let levels: Vec<LogLevel> = all.iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
}
