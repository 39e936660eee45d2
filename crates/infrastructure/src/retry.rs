use domain::TodoError;
use shared::{is_dynamodb_retryable, Config};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 5000,
        }
    }
}

impl From<&Config> for RetryConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            initial_delay_ms: config.retry_initial_delay_ms,
            ..Self::default()
        }
    }
}

/// Retries `operation` with exponential backoff while `is_retryable` holds.
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    config: &RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= config.max_attempts {
                    warn!(
                        max_attempts = config.max_attempts,
                        error = %error,
                        "Giving up after max attempts"
                    );
                    return Err(error);
                }

                if !is_retryable(&error) {
                    debug!(error = %error, "Non-retryable error");
                    return Err(error);
                }

                warn!(delay_ms = delay, error = %error, "Retryable error, backing off");

                sleep(Duration::from_millis(delay)).await;

                delay = ((delay as f64) * config.backoff_multiplier) as u64;
                delay = delay.min(config.max_delay_ms);
            }
        }
    }
}

/// Retry helper for DynamoDB calls; only throttling and availability errors are retried.
pub async fn retry_dynamodb_operation<F, Fut, T>(
    operation: F,
    config: Option<&RetryConfig>,
) -> Result<T, TodoError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, TodoError>>,
{
    let default_config = RetryConfig::default();
    let config = config.unwrap_or(&default_config);

    retry_with_backoff(operation, config, |error| {
        matches!(error, TodoError::DynamoDb(msg) if is_dynamodb_retryable(msg))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            backoff_multiplier: 2.0,
            max_delay_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_second_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("transient")
                    } else {
                        Ok("done")
                    }
                }
            },
            &fast_config(3),
            |_| true,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<&str, &str> = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("always")
                }
            },
            &fast_config(2),
            |_| true,
        )
        .await;

        assert_eq!(result, Err("always"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dynamodb_validation_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), TodoError> = retry_dynamodb_operation(
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TodoError::DynamoDb("ValidationException: bad key".to_string()))
                }
            },
            Some(&fast_config(5)),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dynamodb_throttling_is_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_dynamodb_operation(
            || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TodoError::DynamoDb("ThrottlingException".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            Some(&fast_config(5)),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_config_from_app_config() {
        let config = Config {
            retry_max_attempts: 0,
            retry_initial_delay_ms: 25,
            ..Config::default()
        };
        let retry = RetryConfig::from(&config);

        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.initial_delay_ms, 25);
    }
}
