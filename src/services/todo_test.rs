use super::*;
use crate::state::test_helpers::memory_store;
use crate::services::slot::slot_id;

async fn service() -> TodoService {
    TodoService::new(memory_store().await)
}

#[tokio::test]
async fn add_appends_undone_task() {
    let todo = service().await;
    let tasks = todo.add("buy milk").await.unwrap();
    assert_eq!(tasks, vec![Task { text: "buy milk".into(), done: false }]);
    assert_eq!(todo.list().await.unwrap(), tasks);
}

#[tokio::test]
async fn add_keeps_text_as_entered() {
    let todo = service().await;
    let tasks = todo.add("  padded ").await.unwrap();
    assert_eq!(tasks[0].text, "  padded ");
}

#[tokio::test]
async fn add_rejects_blank_text() {
    let todo = service().await;
    let err = todo.add("   ").await.unwrap_err();
    assert!(matches!(err, UtilityError::Validation(_)));
    assert!(todo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_flips_done_both_ways() {
    let todo = service().await;
    todo.add("a").await.unwrap();
    todo.add("b").await.unwrap();

    let tasks = todo.toggle(1).await.unwrap();
    assert!(!tasks[0].done);
    assert!(tasks[1].done);

    let tasks = todo.toggle(1).await.unwrap();
    assert!(!tasks[1].done);
}

#[tokio::test]
async fn delete_removes_by_index() {
    let todo = service().await;
    todo.add("a").await.unwrap();
    todo.add("b").await.unwrap();
    todo.add("c").await.unwrap();

    let tasks = todo.delete(1).await.unwrap();
    let texts: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "c"]);
}

#[tokio::test]
async fn out_of_range_index_is_validation_error() {
    let todo = service().await;
    todo.add("a").await.unwrap();
    assert!(matches!(todo.toggle(3).await, Err(UtilityError::Validation(_))));
    assert!(matches!(todo.delete(1).await, Err(UtilityError::Validation(_))));
    assert_eq!(todo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn tasks_live_in_their_own_slot_record() {
    let store = memory_store().await;
    let todo = TodoService::new(store.clone());
    todo.add("a").await.unwrap();

    let record = store.get(&slot_id(TASKS_SLOT)).await.unwrap().unwrap();
    assert_eq!(record.fields["items"], serde_json::json!([{"text": "a", "done": false}]));
}
