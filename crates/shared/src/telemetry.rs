use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs a store call and logs its duration and outcome.
pub async fn trace_store_operation<T, E, Fut>(
    backend: &str,
    operation: &str,
    future: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let start_time = Instant::now();
    let result = future.await;
    let duration = start_time.elapsed();

    match &result {
        Ok(_) => {
            info!(
                backend = backend,
                operation = operation,
                duration_ms = duration.as_millis() as u64,
                "Store operation completed successfully"
            );
        }
        Err(e) => {
            error!(
                backend = backend,
                operation = operation,
                duration_ms = duration.as_millis() as u64,
                error = %e,
                "Store operation failed"
            );
        }
    }

    result
}

/// Logs a finished HTTP request; 4xx and 5xx responses are logged as warnings.
pub fn trace_http_request(method: &str, path: &str, status_code: u16) {
    if status_code >= 400 {
        warn!(
            method = method,
            path = path,
            status_code = status_code,
            "HTTP request failed"
        );
    } else {
        info!(
            method = method,
            path = path,
            status_code = status_code,
            "HTTP request completed"
        );
    }
}
