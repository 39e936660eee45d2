use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::Client;
use domain::TodoError;
use shared::Config;

/// Explicitly constructed DynamoDB handle. Cloning shares the underlying
/// connection pool.
#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self::from_client(Client::new(&aws_config), config.dynamodb_table.clone())
    }

    pub fn from_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Flattens an SDK error, including its source chain, into a [`TodoError`].
    pub fn convert_error<E>(&self, error: E) -> TodoError
    where
        E: std::error::Error,
    {
        TodoError::DynamoDb(format!("{}", DisplayErrorContext(error)))
    }
}
