use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Rejected pagination input (non-integer, zero or negative page/limit).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Error)]
pub enum TodoError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
