use domain::{DomainError, TodoError};
use thiserror::Error;

/// Error type shared by every layer above the store.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 4xx
    Client,
    /// 5xx
    Server,
    /// Worth retrying.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retryable: bool,
}

impl AppError {
    pub fn metadata(&self) -> ErrorMetadata {
        match self {
            AppError::InvalidInput(_) => ErrorMetadata {
                code: "INVALID_INPUT",
                category: ErrorCategory::Client,
                severity: ErrorSeverity::Info,
                retryable: false,
            },
            AppError::Validation(_) => ErrorMetadata {
                code: "VALIDATION_ERROR",
                category: ErrorCategory::Client,
                severity: ErrorSeverity::Info,
                retryable: false,
            },
            AppError::NotFound(_) => ErrorMetadata {
                code: "NOT_FOUND",
                category: ErrorCategory::Client,
                severity: ErrorSeverity::Info,
                retryable: false,
            },
            AppError::DynamoDb(msg) => {
                let retryable = is_dynamodb_retryable(msg);
                ErrorMetadata {
                    code: "DYNAMODB_ERROR",
                    category: if retryable {
                        ErrorCategory::Transient
                    } else {
                        ErrorCategory::Server
                    },
                    severity: if retryable {
                        ErrorSeverity::Warning
                    } else {
                        ErrorSeverity::Error
                    },
                    retryable,
                }
            }
            AppError::Serialization(_) => ErrorMetadata {
                code: "SERIALIZATION_ERROR",
                category: ErrorCategory::Server,
                severity: ErrorSeverity::Error,
                retryable: false,
            },
            AppError::Configuration(_) => ErrorMetadata {
                code: "CONFIGURATION_ERROR",
                category: ErrorCategory::Server,
                severity: ErrorSeverity::Critical,
                retryable: false,
            },
            AppError::Internal(_) => ErrorMetadata {
                code: "INTERNAL_ERROR",
                category: ErrorCategory::Server,
                severity: ErrorSeverity::Critical,
                retryable: false,
            },
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) | AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::DynamoDb(_) if self.metadata().retryable => 503,
            _ => 500,
        }
    }

    /// Message safe to hand back to a client.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(_) => "Todo not found".to_string(),
            AppError::DynamoDb(_) if self.metadata().retryable => {
                "Service temporarily unavailable, please retry".to_string()
            }
            _ => "An error occurred while processing the request".to_string(),
        }
    }

    /// Logs the error at a level matching its severity.
    pub fn log(&self) {
        let metadata = self.metadata();
        match metadata.severity {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::error!(
                error = %self,
                code = metadata.code,
                category = ?metadata.category,
                retryable = metadata.retryable,
                "Request failed"
            ),
            ErrorSeverity::Warning => tracing::warn!(
                error = %self,
                code = metadata.code,
                category = ?metadata.category,
                "Request failed"
            ),
            ErrorSeverity::Info => tracing::info!(
                error = %self,
                code = metadata.code,
                "Request rejected"
            ),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidInput(msg) => AppError::InvalidInput(msg),
            DomainError::InvalidTodoId(_) => AppError::Validation("Invalid todo ID".to_string()),
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

impl From<TodoError> for AppError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::DynamoDb(msg) => AppError::DynamoDb(msg),
            TodoError::Internal(msg) => AppError::Internal(msg),
            TodoError::Domain(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

/// Whether a DynamoDB failure message describes a transient condition.
pub fn is_dynamodb_retryable(error_message: &str) -> bool {
    let retryable_errors = [
        "ThrottlingException",
        "ProvisionedThroughputExceededException",
        "ServiceUnavailable",
        "InternalServerError",
        "RequestLimitExceeded",
    ];

    retryable_errors
        .iter()
        .any(|&err| error_message.contains(err))
}
