use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),
}

/// Which document store the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub dynamodb_table: String,
    pub environment: String,
    pub aws_region: String,
    /// Set when running against DynamoDB Local.
    pub dynamodb_endpoint: Option<String>,
    pub store_backend: StoreBackend,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub default_page_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dynamodb_table: "todo-store-dev".to_string(),
            environment: "dev".to_string(),
            aws_region: "ap-northeast-1".to_string(),
            dynamodb_endpoint: None,
            store_backend: StoreBackend::DynamoDb,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 100,
            default_page_limit: domain::DEFAULT_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// [`Config::default`] for anything missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_backend = match lookup("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.store_backend,
        };

        let default_page_limit =
            parse_or(&lookup, "DEFAULT_PAGE_LIMIT", defaults.default_page_limit)?;
        if default_page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_PAGE_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            dynamodb_table: lookup("DYNAMODB_TABLE").unwrap_or(defaults.dynamodb_table),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            store_backend,
            retry_max_attempts: parse_or(
                &lookup,
                "RETRY_MAX_ATTEMPTS",
                defaults.retry_max_attempts,
            )?,
            retry_initial_delay_ms: parse_or(
                &lookup,
                "RETRY_INITIAL_DELAY_MS",
                defaults.retry_initial_delay_ms,
            )?,
            default_page_limit,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}
