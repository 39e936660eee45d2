use crate::store::{CheckedPatch, TodoBackend};
use async_trait::async_trait;
use domain::{Todo, TodoError, TodoId};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local backend. Ids are ULIDs, so map order is creation order.
#[derive(Debug, Default)]
pub struct InMemoryTodoBackend {
    todos: RwLock<BTreeMap<TodoId, Todo>>,
}

impl InMemoryTodoBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoBackend for InMemoryTodoBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(TodoError::Internal(format!("Duplicate todo id: {}", todo.id)));
        }
        todos.insert(todo.id.clone(), todo.clone());
        Ok(())
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        let mut todos: Vec<Todo> = self.todos.read().await.values().cloned().collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(todos)
    }

    async fn apply_patch(
        &self,
        id: &TodoId,
        patch: &CheckedPatch,
    ) -> Result<Option<Todo>, TodoError> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(id).map(|todo| {
            todo.apply_patch(patch.as_patch());
            todo.clone()
        }))
    }

    async fn remove(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        Ok(self.todos.write().await.remove(id))
    }
}
