use domain::TodoId;
use infrastructure::TodoStore;
use lambda_http::http::header::HeaderValue;
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Request, Response};
use shared::telemetry::trace_http_request;

use crate::error::ApiError;
use crate::handlers::{self, build_response};

/// Per-process state shared by every request.
#[derive(Clone)]
pub struct AppContext {
    pub store: TodoStore,
    pub default_page_limit: usize,
}

impl AppContext {
    pub fn new(store: TodoStore, default_page_limit: usize) -> Self {
        Self {
            store,
            default_page_limit,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Collection,
    Item(&'a str),
    Unknown,
}

/// Matches `/todo` and `/todo/{id}`, with or without an `/api` prefix.
fn resolve_route(path: &str) -> Route<'_> {
    let path = match path.strip_prefix("/api") {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };

    match path.trim_end_matches('/').strip_prefix("/todo") {
        Some("") => Route::Collection,
        Some(rest) => match rest.strip_prefix('/') {
            Some(id) if !id.is_empty() && !id.contains('/') => Route::Item(id),
            _ => Route::Unknown,
        },
        None => Route::Unknown,
    }
}

pub async fn route(req: Request, ctx: &AppContext) -> Result<Response<Body>, lambda_http::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    tracing::debug!(path = %path, method = %method, "Incoming request");

    let mut response = match route_inner(&req, ctx, &path).await {
        Ok(resp) => resp,
        Err(e) => {
            e.log();
            e.into_response()
        }
    };
    add_cors_headers(&mut response);

    trace_http_request(method.as_str(), &path, response.status().as_u16());
    Ok(response)
}

async fn route_inner(
    req: &Request,
    ctx: &AppContext,
    path: &str,
) -> Result<Response<Body>, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(build_response(StatusCode::NO_CONTENT, Body::Empty));
    }

    match resolve_route(path) {
        Route::Collection => match *req.method() {
            Method::GET => handlers::list_todos(req, ctx).await,
            Method::POST => handlers::create_todo(req, &ctx.store).await,
            _ => Err(ApiError::MethodNotAllowed),
        },
        Route::Item(raw_id) => {
            let id = TodoId::parse(raw_id)
                .map_err(|_| ApiError::BadRequest("Invalid todo ID".to_string()))?;
            route_item(req, &ctx.store, &id).await
        }
        Route::Unknown => Err(ApiError::RouteNotFound),
    }
}

async fn route_item(
    req: &Request,
    store: &TodoStore,
    id: &TodoId,
) -> Result<Response<Body>, ApiError> {
    match *req.method() {
        Method::GET => handlers::get_todo(store, id).await,
        Method::PUT | Method::PATCH => handlers::update_todo(req, store, id).await,
        Method::DELETE => handlers::delete_todo(store, id).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

fn add_cors_headers(resp: &mut Response<Body>) {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
}
