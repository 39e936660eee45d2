use async_trait::async_trait;
use chrono::Utc;
use domain::{
    apply_completion_rule, paginate_with, NewTodo, Page, PageRequest, Todo, TodoError, TodoId,
    TodoPatch,
};
use shared::telemetry::trace_store_operation;
use std::sync::Arc;
use tracing::debug;

/// Persistence primitives a document store has to provide.
///
/// Implementations must apply `apply_patch` atomically for a single document
/// and must not interpret the patch beyond writing what it says.
#[async_trait]
pub trait TodoBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError>;

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError>;

    /// All todos ordered by creation time.
    async fn list(&self) -> Result<Vec<Todo>, TodoError>;

    /// Writes the patch and returns the updated document, or `None` if it does not exist.
    async fn apply_patch(
        &self,
        id: &TodoId,
        patch: &CheckedPatch,
    ) -> Result<Option<Todo>, TodoError>;

    /// Deletes the document and returns what was removed.
    async fn remove(&self, id: &TodoId) -> Result<Option<Todo>, TodoError>;
}

/// Hook that may rewrite an update payload before it is committed.
pub trait UpdateInterceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn before_update(&self, id: &TodoId, patch: &mut TodoPatch);
}

/// Keeps `completedAt` in step with `isCompleted`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionTimestampRule;

impl UpdateInterceptor for CompletionTimestampRule {
    fn name(&self) -> &'static str {
        "completion_timestamp"
    }

    fn before_update(&self, _id: &TodoId, patch: &mut TodoPatch) {
        apply_completion_rule(patch, Utc::now());
    }
}

/// Update payload that has been through the completion rule.
///
/// Only [`TodoStore`] can build one, so a backend write can never commit an
/// `isCompleted` change without the matching `completedAt`:
///
/// ```compile_fail
/// use domain::{TodoId, TodoPatch};
/// use infrastructure::{InMemoryTodoBackend, TodoBackend};
///
/// async fn write_directly(backend: &InMemoryTodoBackend, id: &TodoId) {
///     let _ = backend.apply_patch(id, &TodoPatch::default().completed(true)).await;
/// }
/// ```
///
/// ```compile_fail
/// use domain::TodoPatch;
/// use infrastructure::CheckedPatch;
///
/// let _ = CheckedPatch(TodoPatch::default().completed(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPatch(TodoPatch);

impl CheckedPatch {
    fn seal(id: &TodoId, mut patch: TodoPatch) -> Self {
        CompletionTimestampRule.before_update(id, &mut patch);
        Self(patch)
    }

    pub fn as_patch(&self) -> &TodoPatch {
        &self.0
    }
}

/// Store handle passed to request handlers.
///
/// Every write that can change a todo goes through [`TodoStore::update_by_id`],
/// which runs the registered interceptors and then seals the patch with the
/// completion rule. Backends only accept a [`CheckedPatch`], so the rule always
/// runs last and cannot be skipped.
#[derive(Clone)]
pub struct TodoStore {
    backend: Arc<dyn TodoBackend>,
    interceptors: Vec<Arc<dyn UpdateInterceptor>>,
}

impl TodoStore {
    pub fn new(backend: impl TodoBackend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn TodoBackend>) -> Self {
        Self {
            backend,
            interceptors: Vec::new(),
        }
    }

    /// Registers an extra interceptor, run in registration order before the completion rule.
    pub fn with_interceptor(mut self, interceptor: impl UpdateInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn create(&self, new_todo: NewTodo) -> Result<Todo, TodoError> {
        let todo = Todo::create(new_todo, Utc::now());
        trace_store_operation(self.backend.name(), "create", self.backend.insert(&todo)).await?;
        debug!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    pub async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        trace_store_operation(self.backend.name(), "find_by_id", self.backend.get(id)).await
    }

    pub async fn find_all(&self) -> Result<Vec<Todo>, TodoError> {
        trace_store_operation(self.backend.name(), "find_all", self.backend.list()).await
    }

    pub async fn find_page(&self, request: PageRequest) -> Result<Page<Todo>, TodoError> {
        let todos = self.find_all().await?;
        Ok(paginate_with(todos, request))
    }

    /// Applies a partial update. Returns `None` when the todo does not exist.
    pub async fn update_by_id(
        &self,
        id: &TodoId,
        mut patch: TodoPatch,
    ) -> Result<Option<Todo>, TodoError> {
        for interceptor in &self.interceptors {
            interceptor.before_update(id, &mut patch);
            debug!(todo_id = %id, interceptor = interceptor.name(), "Update intercepted");
        }
        let patch = CheckedPatch::seal(id, patch);

        trace_store_operation(
            self.backend.name(),
            "update_by_id",
            self.backend.apply_patch(id, &patch),
        )
        .await
    }

    pub async fn mark_completed(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        self.update_by_id(id, TodoPatch::default().completed(true)).await
    }

    pub async fn mark_incomplete(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        self.update_by_id(id, TodoPatch::default().completed(false)).await
    }

    /// Deletes a todo and returns it, or `None` when nothing was stored under `id`.
    pub async fn delete_by_id(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        trace_store_operation(self.backend.name(), "delete_by_id", self.backend.remove(id)).await
    }
}
