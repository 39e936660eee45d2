use domain::{PageRequest, TodoId};
use infrastructure::TodoStore;
use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use shared::{ApiEnvelope, AppError};
use tracing::info;

use crate::error::ApiError;
use crate::models::{CreateTodoRequest, CreatedTodo, UpdateTodoRequest};
use crate::router::AppContext;

pub(crate) fn build_response(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn json_response(
    status: StatusCode,
    body: &impl serde::Serialize,
) -> Result<Response<Body>, ApiError> {
    let json = serde_json::to_string(body).map_err(AppError::from)?;
    Ok(build_response(status, Body::from(json)))
}

fn not_found(id: &TodoId) -> ApiError {
    AppError::NotFound(id.to_string()).into()
}

fn parse_json_body<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    let body_str = match req.body() {
        Body::Text(s) => s.as_str(),
        Body::Binary(b) => std::str::from_utf8(b)
            .map_err(|_| ApiError::BadRequest("Invalid UTF-8".to_string()))?,
        Body::Empty => return Err(ApiError::BadRequest("Empty body".to_string())),
    };

    Ok(serde_json::from_str(body_str)?)
}

pub async fn list_todos(req: &Request, ctx: &AppContext) -> Result<Response<Body>, ApiError> {
    let params = req.query_string_parameters();
    let request = PageRequest::from_query(
        params.first("page"),
        params.first("limit"),
        ctx.default_page_limit,
    )?;

    let page = ctx.store.find_page(request).await?;
    json_response(StatusCode::OK, &ApiEnvelope::ok(page))
}

pub async fn create_todo(req: &Request, store: &TodoStore) -> Result<Response<Body>, ApiError> {
    let input: CreateTodoRequest = parse_json_body(req)?;
    let new_todo = input.into_new_todo()?;

    let todo = store.create(new_todo).await?;
    info!(todo_id = %todo.id, "Todo created");

    json_response(
        StatusCode::CREATED,
        &ApiEnvelope::ok_with_message("Todo created!", CreatedTodo::from(&todo)),
    )
}

pub async fn get_todo(store: &TodoStore, id: &TodoId) -> Result<Response<Body>, ApiError> {
    let todo = store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    json_response(StatusCode::OK, &ApiEnvelope::ok(todo))
}

pub async fn update_todo(
    req: &Request,
    store: &TodoStore,
    id: &TodoId,
) -> Result<Response<Body>, ApiError> {
    let input: UpdateTodoRequest = parse_json_body(req)?;
    let patch = input.into_patch(id)?;

    let todo = store
        .update_by_id(id, patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(todo_id = %id, is_completed = todo.is_completed, "Todo updated");

    json_response(
        StatusCode::OK,
        &ApiEnvelope::ok_with_message("Todo has been updated", todo),
    )
}

pub async fn delete_todo(store: &TodoStore, id: &TodoId) -> Result<Response<Body>, ApiError> {
    store.delete_by_id(id).await?.ok_or_else(|| not_found(id))?;
    info!(todo_id = %id, "Todo deleted");

    json_response(StatusCode::OK, &ApiEnvelope::message("Todo has been deleted!"))
}
