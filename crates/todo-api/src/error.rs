use crate::handlers::build_response;
use domain::{DomainError, TodoError};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use shared::{ApiEnvelope, AppError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::App(e) => StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::App(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            ApiError::App(e) => e.log(),
            other => tracing::info!(error = %other, "Request rejected"),
        }
    }

    pub fn into_response(self) -> Response<Body> {
        let envelope = ApiEnvelope::error(self.client_message());
        let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            r#"{"success":false,"message":"An error occurred while processing the request"}"#
                .to_string()
        });

        build_response(self.status_code(), Body::from(body))
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::App(e.into())
    }
}

impl From<TodoError> for ApiError {
    fn from(e: TodoError) -> Self {
        ApiError::App(e.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(response: Response<Body>) -> serde_json::Value {
        match response.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            Body::Binary(bytes) => serde_json::from_slice(bytes).unwrap(),
            Body::Empty => serde_json::Value::Null,
        }
    }

    #[test]
    fn test_not_found_envelope() {
        let err: ApiError = AppError::NotFound("01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string()).into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response),
            serde_json::json!({"success": false, "message": "Todo not found"})
        );
    }

    #[test]
    fn test_invalid_pagination_is_client_error() {
        let err: ApiError =
            DomainError::InvalidInput("Invalid page or limit value.".to_string()).into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(err.into_response())["message"],
            "Invalid page or limit value."
        );
    }

    #[test]
    fn test_store_failure_hides_details() {
        let err: ApiError =
            TodoError::DynamoDb("AccessDeniedException: secret".to_string()).into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(err.into_response());
        assert_eq!(body["success"], false);
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }
}
