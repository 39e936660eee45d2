use crate::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier. ULIDs sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Parses an identifier received from outside the store (path segment, stored item).
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        ulid::Ulid::from_string(id)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|_| DomainError::InvalidTodoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Materializes a validated creation payload into a stored record.
    pub fn create(new_todo: NewTodo, now: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::new(),
            title: new_todo.title,
            description: new_todo.description,
            is_completed: false,
            completed_at: None,
            created_at: now,
        }
    }

    /// Applies a patch field by field. `id` and `created_at` are never touched.
    pub fn apply_patch(&mut self, patch: &TodoPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
        match &patch.completed_at {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(at) => self.completed_at = Some(*at),
            FieldUpdate::Unset => self.completed_at = None,
        }
    }
}

/// Creation payload. Only title and description are accepted; a new todo
/// always starts incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
}

impl NewTodo {
    pub fn new(title: String, description: Option<String>) -> Result<Self, DomainError> {
        validate_title(&title)?;
        Ok(Self { title, description })
    }
}

pub fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("Title cannot be empty".to_string()));
    }
    Ok(())
}

/// Write directive for a field that can be removed from the stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Set(T),
    Unset,
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }
}

/// Partial update payload handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    /// Derived from `is_completed` by the completion rule.
    pub completed_at: FieldUpdate<DateTime<Utc>>,
}

impl TodoPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_completed.is_none()
            && self.completed_at.is_keep()
    }
}
