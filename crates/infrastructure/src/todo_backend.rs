use crate::models::{item_to_todo, todo_to_item, TodoKeys, UpdateExpression, ENTITY_TYPE_TODO};
use crate::retry::{retry_dynamodb_operation, RetryConfig};
use crate::store::{CheckedPatch, TodoBackend};
use crate::DynamoDbClient;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use domain::{Todo, TodoError, TodoId};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// A put that fails `attribute_not_exists(PK)` on a retry was already applied
/// by an earlier attempt whose response was lost.
fn resolve_insert_conflict(attempt: u32, id: &TodoId) -> Result<(), TodoError> {
    if attempt > 1 {
        debug!(todo_id = %id, attempt, "Put already applied by an earlier attempt");
        Ok(())
    } else {
        Err(TodoError::Internal(format!("Duplicate todo id: {id}")))
    }
}

/// DynamoDB backend. One item per todo; see [`TodoKeys`] for the key layout.
#[derive(Clone)]
pub struct DynamoDbTodoBackend {
    db: DynamoDbClient,
    retry: RetryConfig,
}

impl DynamoDbTodoBackend {
    pub fn new(db: DynamoDbClient, retry: RetryConfig) -> Self {
        Self { db, retry }
    }
}

#[async_trait]
impl TodoBackend for DynamoDbTodoBackend {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError> {
        let item = todo_to_item(todo);
        let item = &item;
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        retry_dynamodb_operation(
            move || async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let result = self
                    .db
                    .client()
                    .put_item()
                    .table_name(self.db.table_name())
                    .set_item(Some(item.clone()))
                    .condition_expression("attribute_not_exists(PK)")
                    .send()
                    .await;

                match result {
                    Ok(_) => Ok(()),
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
                    {
                        resolve_insert_conflict(attempt, &todo.id)
                    }
                    Err(err) => Err(self.db.convert_error(err)),
                }
            },
            Some(&self.retry),
        )
        .await
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let key = TodoKeys::for_todo(id).to_key_map();
        let key = &key;

        let output = retry_dynamodb_operation(
            move || async move {
                self.db
                    .client()
                    .get_item()
                    .table_name(self.db.table_name())
                    .set_key(Some(key.clone()))
                    .consistent_read(true)
                    .send()
                    .await
                    .map_err(|e| self.db.convert_error(e))
            },
            Some(&self.retry),
        )
        .await?;

        output.item().map(item_to_todo).transpose()
    }

    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let exclusive_start_key = &start_key;
            let output = retry_dynamodb_operation(
                move || async move {
                    self.db
                        .client()
                        .scan()
                        .table_name(self.db.table_name())
                        .filter_expression("EntityType = :entity_type")
                        .expression_attribute_values(
                            ":entity_type",
                            AttributeValue::S(ENTITY_TYPE_TODO.to_string()),
                        )
                        .set_exclusive_start_key(exclusive_start_key.clone())
                        .send()
                        .await
                        .map_err(|e| self.db.convert_error(e))
                },
                Some(&self.retry),
            )
            .await?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(count = todos.len(), "Scanned todos");
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(todos)
    }

    async fn apply_patch(
        &self,
        id: &TodoId,
        patch: &CheckedPatch,
    ) -> Result<Option<Todo>, TodoError> {
        let Some(update) = UpdateExpression::from_patch(patch.as_patch()) else {
            return self.get(id).await;
        };
        let update = &update;
        let key = TodoKeys::for_todo(id).to_key_map();
        let key = &key;

        let attributes = retry_dynamodb_operation(
            move || async move {
                let values = if update.values.is_empty() {
                    None
                } else {
                    Some(update.values.clone())
                };

                let result = self
                    .db
                    .client()
                    .update_item()
                    .table_name(self.db.table_name())
                    .set_key(Some(key.clone()))
                    .update_expression(update.expression.clone())
                    .condition_expression("attribute_exists(PK)")
                    .set_expression_attribute_names(Some(update.names.clone()))
                    .set_expression_attribute_values(values)
                    .return_values(ReturnValue::AllNew)
                    .send()
                    .await;

                match result {
                    Ok(output) => Ok(output.attributes().cloned()),
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
                    {
                        Ok(None)
                    }
                    Err(err) => Err(self.db.convert_error(err)),
                }
            },
            Some(&self.retry),
        )
        .await?;

        attributes.as_ref().map(item_to_todo).transpose()
    }

    async fn remove(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let key = TodoKeys::for_todo(id).to_key_map();
        let key = &key;

        let output = retry_dynamodb_operation(
            move || async move {
                self.db
                    .client()
                    .delete_item()
                    .table_name(self.db.table_name())
                    .set_key(Some(key.clone()))
                    .return_values(ReturnValue::AllOld)
                    .send()
                    .await
                    .map_err(|e| self.db.convert_error(e))
            },
            Some(&self.retry),
        )
        .await?;

        output.attributes().map(item_to_todo).transpose()
    }
}
