use async_trait::async_trait;
use chrono::Utc;
use domain::{FieldUpdate, NewTodo, PageRequest, Todo, TodoError, TodoId, TodoPatch};
use infrastructure::{CheckedPatch, InMemoryTodoBackend, TodoBackend, TodoStore, UpdateInterceptor};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

fn store() -> TodoStore {
    TodoStore::new(InMemoryTodoBackend::new())
}

async fn create(store: &TodoStore, title: &str) -> domain::Todo {
    store
        .create(NewTodo::new(title.to_string(), None).unwrap())
        .await
        .expect("create should succeed")
}

#[tokio::test]
async fn test_create_and_find_by_id() {
    let store = store();
    let created = store
        .create(NewTodo::new("Buy milk".to_string(), Some("2 litres".to_string())).unwrap())
        .await
        .unwrap();

    let found = store.find_by_id(&created.id).await.unwrap().unwrap();

    assert_eq!(found, created);
    assert!(!found.is_completed);
    assert!(found.completed_at.is_none());
}

#[tokio::test]
async fn test_find_by_unknown_id_is_none() {
    let store = store();

    assert!(store.find_by_id(&TodoId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_completing_sets_timestamp() {
    let store = store();
    let todo = create(&store, "Ship release").await;
    let before = Utc::now();

    let updated = store
        .update_by_id(&todo.id, TodoPatch::default().completed(true))
        .await
        .unwrap()
        .unwrap();

    assert!(updated.is_completed);
    let completed_at = updated.completed_at.expect("completedAt should be set");
    assert!(completed_at >= before);

    let stored = store.find_by_id(&todo.id).await.unwrap().unwrap();
    assert_eq!(stored.completed_at, Some(completed_at));
}

#[tokio::test]
async fn test_reopening_clears_timestamp() {
    let store = store();
    let todo = create(&store, "Call plumber").await;
    store.mark_completed(&todo.id).await.unwrap();

    let reopened = store
        .update_by_id(&todo.id, TodoPatch::default().completed(false))
        .await
        .unwrap()
        .unwrap();

    assert!(!reopened.is_completed);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn test_update_without_flag_keeps_timestamp() {
    let store = store();
    let todo = create(&store, "Draft").await;
    let completed = store.mark_completed(&todo.id).await.unwrap().unwrap();

    let renamed = store
        .update_by_id(&todo.id, TodoPatch::default().title("x"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(renamed.title, "x");
    assert!(renamed.is_completed);
    assert_eq!(renamed.completed_at, completed.completed_at);
}

#[tokio::test]
async fn test_completing_twice_keeps_field_present() {
    let store = store();
    let todo = create(&store, "Idempotent").await;

    let first = store.mark_completed(&todo.id).await.unwrap().unwrap();
    let second = store.mark_completed(&todo.id).await.unwrap().unwrap();

    assert!(second.is_completed);
    assert!(second.completed_at.is_some());
    assert!(second.completed_at >= first.completed_at);
}

#[tokio::test]
async fn test_mark_incomplete_goes_through_rule() {
    let store = store();
    let todo = create(&store, "Reopen me").await;
    store.mark_completed(&todo.id).await.unwrap();

    let reopened = store.mark_incomplete(&todo.id).await.unwrap().unwrap();

    assert!(!reopened.is_completed);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn test_caller_cannot_forge_completed_at() {
    let store = store();
    let todo = create(&store, "Forged").await;
    let forged = Utc::now() - chrono::Duration::days(30);

    let patch = TodoPatch {
        is_completed: Some(true),
        completed_at: FieldUpdate::Set(forged),
        ..TodoPatch::default()
    };
    let updated = store.update_by_id(&todo.id, patch).await.unwrap().unwrap();

    assert!(updated.completed_at.unwrap() > forged);
}

struct ForceComplete {
    calls: Arc<AtomicU32>,
}

impl UpdateInterceptor for ForceComplete {
    fn name(&self) -> &'static str {
        "force_complete"
    }

    fn before_update(&self, _id: &TodoId, patch: &mut TodoPatch) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        patch.is_completed = Some(true);
    }
}

#[tokio::test]
async fn test_custom_interceptor_runs_before_completion_rule() {
    let calls = Arc::new(AtomicU32::new(0));
    let store = store().with_interceptor(ForceComplete {
        calls: calls.clone(),
    });
    let todo = create(&store, "Intercepted").await;

    let updated = store
        .update_by_id(&todo.id, TodoPatch::default().title("renamed"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(updated.is_completed);
    assert!(updated.completed_at.is_some());
}

/// Backend that keeps a copy of every patch it is asked to write.
#[derive(Default)]
struct RecordingBackend {
    inner: InMemoryTodoBackend,
    patches: Mutex<Vec<TodoPatch>>,
}

#[async_trait]
impl TodoBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError> {
        self.inner.insert(todo).await
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        self.inner.list().await
    }

    async fn apply_patch(
        &self,
        id: &TodoId,
        patch: &CheckedPatch,
    ) -> Result<Option<Todo>, TodoError> {
        self.patches.lock().unwrap().push(patch.as_patch().clone());
        self.inner.apply_patch(id, patch).await
    }

    async fn remove(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        self.inner.remove(id).await
    }
}

#[tokio::test]
async fn test_backend_writes_always_carry_completion_timestamp() {
    let backend = Arc::new(RecordingBackend::default());
    let calls = Arc::new(AtomicU32::new(0));
    let store = TodoStore::from_arc(backend.clone()).with_interceptor(ForceComplete {
        calls: calls.clone(),
    });
    let todo = create(&store, "Recorded").await;

    store
        .update_by_id(&todo.id, TodoPatch::default().title("renamed"))
        .await
        .unwrap();
    let forged = TodoPatch {
        completed_at: FieldUpdate::Unset,
        ..TodoPatch::default().completed(true)
    };
    store.update_by_id(&todo.id, forged).await.unwrap();

    let reopen = TodoStore::from_arc(backend.clone());
    reopen.mark_incomplete(&todo.id).await.unwrap();
    reopen
        .update_by_id(&todo.id, TodoPatch::default().description("notes"))
        .await
        .unwrap();

    let patches = backend.patches.lock().unwrap().clone();
    assert_eq!(patches.len(), 4);
    for patch in &patches {
        match patch.is_completed {
            Some(true) => assert!(matches!(patch.completed_at, FieldUpdate::Set(_))),
            Some(false) => assert_eq!(patch.completed_at, FieldUpdate::Unset),
            None => assert_eq!(patch.completed_at, FieldUpdate::Keep),
        }
    }

    let stored = store.find_by_id(&todo.id).await.unwrap().unwrap();
    assert!(!stored.is_completed);
    assert!(stored.completed_at.is_none());
}

#[tokio::test]
async fn test_update_unknown_id_returns_none() {
    let store = store();

    let result = store
        .update_by_id(&TodoId::new(), TodoPatch::default().completed(true))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_empty_patch_returns_current_record() {
    let store = store();
    let todo = create(&store, "Unchanged").await;

    let same = store
        .update_by_id(&todo.id, TodoPatch::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(same, todo);
}

#[tokio::test]
async fn test_delete_by_id() {
    let store = store();
    let todo = create(&store, "Temporary").await;

    let deleted = store.delete_by_id(&todo.id).await.unwrap();
    assert_eq!(deleted.map(|t| t.id), Some(todo.id.clone()));

    assert!(store.find_by_id(&todo.id).await.unwrap().is_none());
    assert!(store.delete_by_id(&todo.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_page_in_creation_order() {
    let store = store();
    let mut ids = Vec::new();
    for title in ["one", "two", "three", "four", "five"] {
        ids.push(create(&store, title).await.id);
    }

    let page = store
        .find_page(PageRequest::new(2, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(page.current_page, 2);
    assert!(page.has_next_page);
    let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["three", "four"]);
    assert_eq!(page.items[0].id, ids[2]);

    let past_end = store
        .find_page(PageRequest::new(4, 2).unwrap())
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert!(!past_end.has_next_page);
}

#[tokio::test]
async fn test_concurrent_completions_on_shared_store() {
    let store = store();
    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(create(&store, &format!("todo {i}")).await.id);
    }

    let updates = ids.iter().map(|id| {
        let store = store.clone();
        let id = id.clone();
        async move { store.mark_completed(&id).await }
    });
    let results = futures::future::join_all(updates).await;

    for result in results {
        let todo = result.unwrap().unwrap();
        assert!(todo.is_completed);
        assert!(todo.completed_at.is_some());
    }
    assert!(store
        .find_all()
        .await
        .unwrap()
        .iter()
        .all(|t| t.is_completed && t.completed_at.is_some()));
}
