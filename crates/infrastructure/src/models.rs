use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use domain::{FieldUpdate, Todo, TodoError, TodoId, TodoPatch};
use std::collections::HashMap;

pub const ENTITY_TYPE_TODO: &str = "Todo";

const ATTR_ID: &str = "id";
const ATTR_TITLE: &str = "title";
const ATTR_DESCRIPTION: &str = "description";
const ATTR_IS_COMPLETED: &str = "isCompleted";
const ATTR_COMPLETED_AT: &str = "completedAt";
const ATTR_CREATED_AT: &str = "createdAt";

/// Single-table keys for a todo item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoKeys {
    pub pk: String,
    pub sk: String,
}

impl TodoKeys {
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: format!("TODO#{}", todo_id.as_str()),
            sk: "TODO".to_string(),
        }
    }

    pub fn to_key_map(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// Converts a todo into a full DynamoDB item, keys included.
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    let mut item = TodoKeys::for_todo(&todo.id).to_key_map();

    item.insert(
        "EntityType".to_string(),
        AttributeValue::S(ENTITY_TYPE_TODO.to_string()),
    );
    item.insert(ATTR_ID.to_string(), AttributeValue::S(todo.id.as_str().to_string()));
    item.insert(ATTR_TITLE.to_string(), AttributeValue::S(todo.title.clone()));

    if let Some(description) = &todo.description {
        item.insert(
            ATTR_DESCRIPTION.to_string(),
            AttributeValue::S(description.clone()),
        );
    }

    item.insert(
        ATTR_IS_COMPLETED.to_string(),
        AttributeValue::Bool(todo.is_completed),
    );

    if let Some(completed_at) = todo.completed_at {
        item.insert(
            ATTR_COMPLETED_AT.to_string(),
            AttributeValue::S(completed_at.to_rfc3339()),
        );
    }

    item.insert(
        ATTR_CREATED_AT.to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339()),
    );

    item
}

/// Restores a todo from a stored item. The id comes from the item itself.
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, TodoError> {
    let id = required_string(item, ATTR_ID)?;
    let id = TodoId::parse(&id)?;

    let is_completed = match item.get(ATTR_IS_COMPLETED) {
        Some(value) => *value
            .as_bool()
            .map_err(|_| corrupt(ATTR_IS_COMPLETED))?,
        None => false,
    };

    let completed_at = optional_string(item, ATTR_COMPLETED_AT)?
        .map(|s| parse_timestamp(&s, ATTR_COMPLETED_AT))
        .transpose()?;

    Ok(Todo {
        id,
        title: required_string(item, ATTR_TITLE)?,
        description: optional_string(item, ATTR_DESCRIPTION)?,
        is_completed,
        completed_at,
        created_at: parse_timestamp(&required_string(item, ATTR_CREATED_AT)?, ATTR_CREATED_AT)?,
    })
}

fn required_string(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<String, TodoError> {
    optional_string(item, name)?
        .ok_or_else(|| TodoError::Internal(format!("Stored todo is missing {name}")))
}

fn optional_string(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<Option<String>, TodoError> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(value) => value
            .as_s()
            .map(|s| Some(s.clone()))
            .map_err(|_| corrupt(name)),
    }
}

fn parse_timestamp(raw: &str, name: &str) -> Result<DateTime<Utc>, TodoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupt(name))
}

fn corrupt(name: &str) -> TodoError {
    TodoError::Internal(format!("Stored todo has an invalid {name}"))
}

/// `UpdateItem` expression compiled from a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    /// Returns `None` when the patch changes nothing.
    pub fn from_patch(patch: &TodoPatch) -> Option<Self> {
        let mut set_parts = Vec::new();
        let mut remove_parts = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        let mut set = |attr: &str, value: AttributeValue| {
            names.insert(format!("#{attr}"), attr.to_string());
            values.insert(format!(":{attr}"), value);
            set_parts.push(format!("#{attr} = :{attr}"));
        };

        if let Some(title) = &patch.title {
            set(ATTR_TITLE, AttributeValue::S(title.clone()));
        }
        if let Some(description) = &patch.description {
            set(ATTR_DESCRIPTION, AttributeValue::S(description.clone()));
        }
        if let Some(is_completed) = patch.is_completed {
            set(ATTR_IS_COMPLETED, AttributeValue::Bool(is_completed));
        }
        match &patch.completed_at {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(at) => set(ATTR_COMPLETED_AT, AttributeValue::S(at.to_rfc3339())),
            FieldUpdate::Unset => {
                names.insert(format!("#{ATTR_COMPLETED_AT}"), ATTR_COMPLETED_AT.to_string());
                remove_parts.push(format!("#{ATTR_COMPLETED_AT}"));
            }
        }

        let mut clauses = Vec::new();
        if !set_parts.is_empty() {
            clauses.push(format!("SET {}", set_parts.join(", ")));
        }
        if !remove_parts.is_empty() {
            clauses.push(format!("REMOVE {}", remove_parts.join(", ")));
        }
        if clauses.is_empty() {
            return None;
        }

        Some(Self {
            expression: clauses.join(" "),
            names,
            values,
        })
    }
}
