use super::*;
use crate::state::test_helpers::memory_store;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

fn text_of(record: &StoredRecord) -> Option<&str> {
    record.fields.get("text").and_then(Value::as_str)
}

// =============================================================================
// put
// =============================================================================

#[tokio::test]
async fn put_without_id_generates_unique_ids() {
    let store = memory_store().await;
    let mut seen = HashSet::new();
    for i in 0..20 {
        let stored = store.put(Record::new().field("n", i)).await.unwrap();
        assert!(!stored.id.is_empty());
        assert!(seen.insert(stored.id), "generated id was reused");
    }
    assert_eq!(store.all().await.unwrap().len(), 20);
}

#[tokio::test]
async fn put_with_empty_id_generates_one() {
    let store = memory_store().await;
    let stored = store.put(Record::with_id("").field("text", "a")).await.unwrap();
    assert!(!stored.id.is_empty());
    assert!(store.get(&stored.id).await.unwrap().is_some());
}

#[tokio::test]
async fn put_keeps_caller_id() {
    let store = memory_store().await;
    let stored = store.put(Record::with_id("tasks").field("items", json!([]))).await.unwrap();
    assert_eq!(stored.id, "tasks");
}

#[tokio::test]
async fn put_replaces_whole_record() {
    let store = memory_store().await;
    let first = store
        .put(Record::with_id("r1").field("text", "a").field("color", "red"))
        .await
        .unwrap();
    assert!(first.fields.contains_key("color"));

    let second = store.put(Record::with_id("r1").field("text", "b")).await.unwrap();
    assert_eq!(text_of(&second), Some("b"));
    assert!(!second.fields.contains_key("color"));

    let loaded = store.get("r1").await.unwrap().unwrap();
    assert_eq!(text_of(&loaded), Some("b"));
    assert!(!loaded.fields.contains_key("color"), "fields must not be merged");
    assert_eq!(store.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn put_overwrites_caller_updated_at() {
    let store = memory_store().await;
    let stored = store
        .put(Record::new().field(UPDATED_AT_FIELD, 5).field("text", "a"))
        .await
        .unwrap();
    assert!(stored.updated_at > 5);
    assert!(!stored.fields.contains_key(UPDATED_AT_FIELD));

    let loaded = store.get(&stored.id).await.unwrap().unwrap();
    assert_eq!(loaded.updated_at, stored.updated_at);
}

#[tokio::test]
async fn put_strips_id_from_payload_fields() {
    let store = memory_store().await;
    let stored = store.put(Record::with_id("a").field(ID_FIELD, "b")).await.unwrap();
    assert_eq!(stored.id, "a");
    assert!(!stored.fields.contains_key(ID_FIELD));
}

#[tokio::test]
async fn updated_at_never_moves_backwards() {
    let store = memory_store().await;
    let first = store.put(Record::with_id("clock").field("v", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = store.put(Record::with_id("clock").field("v", 2)).await.unwrap();
    assert!(second.updated_at >= first.updated_at);
}

// =============================================================================
// get / delete
// =============================================================================

#[tokio::test]
async fn get_missing_is_none() {
    let store = memory_store().await;
    assert!(store.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn get_after_delete_is_none() {
    let store = memory_store().await;
    let stored = store.put(Record::new().field("text", "a")).await.unwrap();
    store.delete(&stored.id).await.unwrap();
    assert!(store.get(&stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_id_succeeds_and_changes_nothing() {
    let store = memory_store().await;
    store.put(Record::with_id("keep").field("text", "a")).await.unwrap();
    let before = store.all().await.unwrap();

    store.delete("missing").await.unwrap();

    assert_eq!(store.all().await.unwrap(), before);
}

// =============================================================================
// all / clear
// =============================================================================

#[tokio::test]
async fn all_on_empty_collection_is_empty() {
    let store = memory_store().await;
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn all_counts_distinct_ids_minus_deleted() {
    let store = memory_store().await;
    for id in ["a", "b", "c", "a"] {
        store.put(Record::with_id(id).field("text", id)).await.unwrap();
    }
    store.delete("b").await.unwrap();

    let ids: Vec<String> = store.all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn clear_twice_is_idempotent() {
    let store = memory_store().await;
    store.put(Record::new().field("text", "a")).await.unwrap();
    store.put(Record::new().field("text", "b")).await.unwrap();

    store.clear().await.unwrap();
    assert!(store.all().await.unwrap().is_empty());
    store.clear().await.unwrap();
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_except_keeps_prefixed_ids() {
    let store = memory_store().await;
    store.put(Record::with_id("widget:tasks").field("items", json!([]))).await.unwrap();
    store.put(Record::with_id("widget").field("text", "short")).await.unwrap();
    store.put(Record::with_id("tasks").field("text", "plain")).await.unwrap();
    store.put(Record::new().field("text", "generated")).await.unwrap();

    store.clear_except("widget:").await.unwrap();
    let ids: Vec<String> = store.all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["widget:tasks".to_string()]);
}

// =============================================================================
// end-to-end lifecycle
// =============================================================================

#[tokio::test]
async fn record_lifecycle_put_replace_get_delete() {
    let store = memory_store().await;

    let created = store.put(Record::new().field("text", "a")).await.unwrap();
    assert_eq!(text_of(&created), Some("a"));
    let id = created.id.clone();

    let replaced = store.put(Record::with_id(id.clone()).field("text", "b")).await.unwrap();
    assert_eq!(replaced.id, id);
    assert_eq!(text_of(&replaced), Some("b"));
    assert!(replaced.updated_at >= created.updated_at);

    let loaded = store.get(&id).await.unwrap().unwrap();
    assert_eq!(loaded, replaced);

    store.delete(&id).await.unwrap();
    assert!(store.get(&id).await.unwrap().is_none());
}

// =============================================================================
// errors
// =============================================================================

#[tokio::test]
async fn closed_store_reports_storage_unavailable() {
    let store = memory_store().await;
    store.close().await;
    assert!(store.is_closed());

    let err = store.put(Record::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)), "got {err:?}");
    let err = store.get("x").await.unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_table_reports_transaction_failed() {
    let store = memory_store().await;
    sqlx::query("DROP TABLE items").execute(store.pool()).await.unwrap();

    let err = store.put(Record::new().field("text", "a")).await.unwrap_err();
    assert!(matches!(err, StoreError::TransactionFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn non_object_payload_is_corrupt() {
    let store = memory_store().await;
    sqlx::query("INSERT INTO items (id, updated_at, data) VALUES ('bad', 1, '[1,2]')")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.get("bad").await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptRecord { ref id, .. } if id == "bad"));
    assert!(store.all().await.is_err());
}

#[tokio::test]
async fn open_unreachable_path_is_storage_unavailable() {
    let result = LocalStore::open("sqlite:///nonexistent-dir-7u/sub/db.sqlite", 1).await;
    assert!(matches!(result, Err(StoreError::StorageUnavailable(_))));
}

#[test]
fn pool_errors_classify_as_unavailable() {
    assert!(matches!(StoreError::from(sqlx::Error::PoolClosed), StoreError::StorageUnavailable(_)));
    assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::StorageUnavailable(_)));
    assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::TransactionFailed(_)));
}

// =============================================================================
// typed payloads
// =============================================================================

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Memo {
    text: String,
    pinned: bool,
}

#[tokio::test]
async fn typed_payload_round_trips_through_store() {
    let store = memory_store().await;
    let memo = Memo { text: "call mom".into(), pinned: true };
    let stored = store.put(Record::from_payload(None, &memo).unwrap()).await.unwrap();

    let loaded = store.get(&stored.id).await.unwrap().unwrap();
    assert_eq!(loaded.decode::<Memo>().unwrap(), memo);
}

#[test]
fn from_payload_rejects_non_objects() {
    assert!(Record::from_payload(None, &vec![1, 2, 3]).is_err());
}

#[test]
fn stored_record_serializes_flat() {
    let record = StoredRecord {
        id: "g".into(),
        updated_at: 42,
        fields: json!({"text": "b"}).as_object().cloned().unwrap(),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value, json!({"id": "g", "updatedAt": 42, "text": "b"}));
}

#[test]
fn record_deserializes_without_id() {
    let record: Record = serde_json::from_value(json!({"text": "a"})).unwrap();
    assert!(record.id.is_none());
    assert_eq!(record.fields.get("text"), Some(&json!("a")));
}
