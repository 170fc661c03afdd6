use std::sync::Arc;

use chrono::{Duration, Utc};

use autoreply_protocols::{AutomationError, KvStore, MemoryKvStore, PendingReply};

use super::*;

fn outbox() -> (ReplyOutbox, Arc<MemoryKvStore>) {
    let store = Arc::new(MemoryKvStore::new());
    (ReplyOutbox::new(store.clone()), store)
}

#[tokio::test]
async fn test_put_take_roundtrip() {
    let (outbox, _store) = outbox();
    let record = PendingReply::new("明日の会議の件", "田中").with_return_to_feed(true);
    outbox.put(&record).await.unwrap();

    let taken = outbox.take(Duration::minutes(5)).await.unwrap().unwrap();
    assert_eq!(taken.message_text, "明日の会議の件");
    assert_eq!(taken.sender_name, "田中");
    assert!(taken.return_to_feed);
}

#[tokio::test]
async fn test_take_consumes_exactly_once() {
    let (outbox, store) = outbox();
    outbox.put(&PendingReply::new("msg", "s")).await.unwrap();

    assert!(outbox.take(Duration::minutes(5)).await.unwrap().is_some());
    // Deleted from storage immediately after consumption.
    assert_eq!(store.get(OUTBOX_KEY).await.unwrap(), None);
    assert!(outbox.take(Duration::minutes(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_record_discarded() {
    let (outbox, store) = outbox();
    let mut record = PendingReply::new("msg", "s");
    record.created_at = Utc::now() - Duration::minutes(6);
    outbox.put(&record).await.unwrap();

    match outbox.take(Duration::minutes(5)).await {
        Err(AutomationError::StaleHandoff { age_seconds }) => assert!(age_seconds >= 360),
        other => panic!("expected stale handoff, got {other:?}"),
    }
    // Stale records are also deleted, not left behind.
    assert_eq!(store.get(OUTBOX_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_fresh_record_just_under_limit() {
    let (outbox, _store) = outbox();
    let mut record = PendingReply::new("msg", "s");
    record.created_at = Utc::now() - Duration::minutes(4);
    outbox.put(&record).await.unwrap();

    assert!(outbox.take(Duration::minutes(5)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_new_write_overwrites_old() {
    let (outbox, _store) = outbox();
    outbox.put(&PendingReply::new("first", "a")).await.unwrap();
    outbox.put(&PendingReply::new("second", "b")).await.unwrap();

    let taken = outbox.take(Duration::minutes(5)).await.unwrap().unwrap();
    assert_eq!(taken.message_text, "second");
    assert!(outbox.take(Duration::minutes(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_record_dropped() {
    let (outbox, store) = outbox();
    store.set(OUTBOX_KEY, "not json").await.unwrap();

    assert!(outbox.take(Duration::minutes(5)).await.unwrap().is_none());
    assert_eq!(store.get(OUTBOX_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_clear() {
    let (outbox, store) = outbox();
    outbox.put(&PendingReply::new("msg", "s")).await.unwrap();
    outbox.clear().await.unwrap();
    assert_eq!(store.get(OUTBOX_KEY).await.unwrap(), None);
}
