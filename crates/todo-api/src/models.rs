use crate::error::ApiError;
use domain::{validate_title, DomainError, NewTodo, Todo, TodoId, TodoPatch};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTodoRequest {
    pub fn into_new_todo(self) -> Result<NewTodo, DomainError> {
        NewTodo::new(self.title, self.description)
    }
}

/// Partial update body. `completedAt` is derived by the store and is not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn into_patch(self, path_id: &TodoId) -> Result<TodoPatch, ApiError> {
        if let Some(raw_id) = &self.id {
            let body_id = TodoId::parse(raw_id)
                .map_err(|_| ApiError::BadRequest("Invalid todo ID".to_string()))?;
            if &body_id != path_id {
                return Err(ApiError::BadRequest(
                    "Body id does not match the todo being updated".to_string(),
                ));
            }
        }

        if let Some(title) = &self.title {
            validate_title(title)?;
        }

        Ok(TodoPatch {
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            ..TodoPatch::default()
        })
    }
}

/// Summary returned by the create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTodo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_completed: bool,
}

impl From<&Todo> for CreatedTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            is_completed: todo.is_completed,
        }
    }
}
